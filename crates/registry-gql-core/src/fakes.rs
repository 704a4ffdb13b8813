//! In-memory fakes for the collaborator traits (testing only)
//!
//! Provides `ScriptedExecutor`, `MemoryCorrelationLog`, and
//! `EchoMutationBackend` that satisfy the trait contracts without a backend.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use crate::collaborators::*;
use crate::error::ExecutorError;

// ---------------------------------------------------------------------------
// ScriptedExecutor
// ---------------------------------------------------------------------------

/// Answers documents from a queue of prepared results and records every
/// document it was handed.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    responses: Mutex<VecDeque<ExecutorResult<ResponseEnvelope>>>,
    documents: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an envelope for the next `execute` call.
    pub fn push(&self, envelope: ResponseEnvelope) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(envelope));
        self
    }

    /// Queue a `data`-only envelope.
    pub fn push_data(&self, data: serde_json::Value) -> &Self {
        self.push(ResponseEnvelope::from_data(data))
    }

    /// Queue a collaborator failure.
    pub fn push_error(&self, error: ExecutorError) -> &Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Documents received so far, in call order.
    pub fn documents(&self) -> Vec<String> {
        self.documents.lock().unwrap().clone()
    }

    pub fn last_document(&self) -> Option<String> {
        self.documents.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl QueryExecutor for ScriptedExecutor {
    async fn execute(&self, document: &str) -> ExecutorResult<ResponseEnvelope> {
        self.documents.lock().unwrap().push(document.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ExecutorError::Transport("no scripted response left".into())))
    }
}

// ---------------------------------------------------------------------------
// MemoryCorrelationLog
// ---------------------------------------------------------------------------

/// Mutation log backed by a `HashMap<client_mutation_id, entry>`.
#[derive(Debug, Default)]
pub struct MemoryCorrelationLog {
    entries: Mutex<HashMap<String, MutationCorrelation>>,
    lookups: Mutex<Vec<ClientMutationId>>,
}

impl MemoryCorrelationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or overwrite) the entry for its correlation id.
    pub fn record(&self, entry: MutationCorrelation) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(entry.client_mutation_id.0.clone(), entry);
    }

    /// Ids looked up so far, in call order.
    pub fn lookups(&self) -> Vec<ClientMutationId> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl CorrelationLog for MemoryCorrelationLog {
    async fn lookup_by_correlation_id(
        &self,
        id: &ClientMutationId,
    ) -> ExecutorResult<Option<MutationCorrelation>> {
        self.lookups.lock().unwrap().push(id.clone());
        let entries = self.entries.lock().unwrap();
        Ok(entries.get(id.as_str()).cloned())
    }
}

// ---------------------------------------------------------------------------
// EchoMutationBackend
// ---------------------------------------------------------------------------

/// Acknowledges every mutation with the `clientMutationId` it carried and,
/// when an outcome is configured, records that outcome in the shared log
/// before answering.
#[derive(Debug)]
pub struct EchoMutationBackend {
    log: Arc<MemoryCorrelationLog>,
    outcome: Option<MutationStatus>,
    documents: Mutex<Vec<String>>,
}

impl EchoMutationBackend {
    pub fn new(log: Arc<MemoryCorrelationLog>, outcome: Option<MutationStatus>) -> Self {
        Self {
            log,
            outcome,
            documents: Mutex::new(Vec::new()),
        }
    }

    pub fn documents(&self) -> Vec<String> {
        self.documents.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryExecutor for EchoMutationBackend {
    async fn execute(&self, document: &str) -> ExecutorResult<ResponseEnvelope> {
        self.documents.lock().unwrap().push(document.to_string());

        let name = mutation_name(document)
            .ok_or_else(|| ExecutorError::Decode("document is not a mutation".into()))?;
        let id = client_mutation_id(document)
            .ok_or_else(|| ExecutorError::Decode("document has no clientMutationId".into()))?;

        match self.outcome {
            Some(MutationStatus::Success) => self.log.record(MutationCorrelation::success(id.clone())),
            Some(MutationStatus::Error) => self
                .log
                .record(MutationCorrelation::error(id.clone(), "rejected by backend")),
            Some(MutationStatus::Pending) => self.log.record(MutationCorrelation::pending(id.clone())),
            None => {}
        }

        let mut data = serde_json::Map::new();
        data.insert(
            name,
            json!({"clientMutationId": id.as_str(), "internalId": "1"}),
        );
        Ok(ResponseEnvelope::from_data(serde_json::Value::Object(data)))
    }
}

fn mutation_name(document: &str) -> Option<String> {
    let body = document.trim_start().strip_prefix("mutation")?;
    let body = body.trim_start().strip_prefix('{')?;
    let name: String = body
        .trim_start()
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    (!name.is_empty()).then_some(name)
}

fn client_mutation_id(document: &str) -> Option<ClientMutationId> {
    let (_, rest) = document.split_once("clientMutationId: \"")?;
    let (id, _) = rest.split_once('"')?;
    Some(ClientMutationId::from(id))
}
