//! Collaborator seams for registry operations
//!
//! The core never talks to a network or a database itself. It depends on two
//! narrow capabilities supplied by the caller:
//! - `QueryExecutor`: runs a rendered GraphQL document and returns the parsed envelope
//! - `CorrelationLog`: resolves the outcome of a mutation by its client mutation id
//!
//! Both traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ExecutorError;

/// Result type for collaborator calls
pub type ExecutorResult<T> = std::result::Result<T, ExecutorError>;

// ---------------------------------------------------------------------------
// QueryExecutor
// ---------------------------------------------------------------------------

/// A single entry of a GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphqlError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
            extensions: None,
        }
    }
}

/// Parsed GraphQL response: `{data: {...}, errors?: [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<GraphqlError>>,
}

impl ResponseEnvelope {
    /// Envelope carrying only `data`.
    pub fn from_data(data: Value) -> Self {
        Self { data, errors: None }
    }

    /// Top-level errors, if any were reported. An empty array counts as none.
    pub fn errors(&self) -> Option<&[GraphqlError]> {
        self.errors.as_deref().filter(|errors| !errors.is_empty())
    }

    /// The `data.<root>` object, if present.
    pub fn root(&self, name: &str) -> Option<&Value> {
        self.data.get(name).filter(|value| !value.is_null())
    }
}

/// Executes rendered GraphQL documents against the backend.
///
/// Implementations own caller identity and credentials; the core only hands
/// over the document text. Retries and timeouts, if any, belong here.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Execute a query or mutation document.
    async fn execute(&self, document: &str) -> ExecutorResult<ResponseEnvelope>;
}

// ---------------------------------------------------------------------------
// CorrelationLog
// ---------------------------------------------------------------------------

/// Client-generated correlation id embedded in every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientMutationId(pub String);

impl ClientMutationId {
    /// Generate a new random id
    pub fn new() -> Self {
        ClientMutationId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClientMutationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientMutationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ClientMutationId {
    fn from(value: &str) -> Self {
        ClientMutationId(value.to_string())
    }
}

/// Outcome recorded by the backend for a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationStatus {
    Pending,
    Success,
    Error,
}

impl std::fmt::Display for MutationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MutationStatus::Pending => "pending",
            MutationStatus::Success => "success",
            MutationStatus::Error => "error",
        };
        f.write_str(label)
    }
}

/// A mutation-log entry as seen by the core (read-only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationCorrelation {
    pub client_mutation_id: ClientMutationId,
    pub status: MutationStatus,
    pub error_detail: Option<String>,
    pub recorded_at: Option<DateTime<Utc>>,
}

impl MutationCorrelation {
    pub fn success(id: ClientMutationId) -> Self {
        Self {
            client_mutation_id: id,
            status: MutationStatus::Success,
            error_detail: None,
            recorded_at: Some(Utc::now()),
        }
    }

    pub fn error(id: ClientMutationId, detail: impl Into<String>) -> Self {
        Self {
            client_mutation_id: id,
            status: MutationStatus::Error,
            error_detail: Some(detail.into()),
            recorded_at: Some(Utc::now()),
        }
    }

    pub fn pending(id: ClientMutationId) -> Self {
        Self {
            client_mutation_id: id,
            status: MutationStatus::Pending,
            error_detail: None,
            recorded_at: None,
        }
    }
}

/// Read access to the mutation log.
///
/// Guarantees expected by the core:
/// - `lookup_by_correlation_id` never mutates the log.
/// - `Ok(None)` means nothing has been recorded for the id (yet).
#[async_trait]
pub trait CorrelationLog: Send + Sync {
    async fn lookup_by_correlation_id(
        &self,
        id: &ClientMutationId,
    ) -> ExecutorResult<Option<MutationCorrelation>>;
}
