//! Registry operation manager.
//!
//! Orchestrates one round trip per call: build the document, hand it to the
//! [`QueryExecutor`], decode and map the answer. Mutations are additionally
//! resolved through the [`CorrelationLog`]:
//!
//! ```text
//! Submitted --(execute)--> Acknowledged --(lookup)--> Succeeded | Failed
//! ```
//!
//! The execution always completes before the lookup starts. Nothing is
//! retried here.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn, Instrument};

use crate::collaborators::{
    ClientMutationId, CorrelationLog, MutationStatus, QueryExecutor, ResponseEnvelope,
};
use crate::decoder::{extract_records, page_info};
use crate::document::{DocumentBuilder, ListQuery, MutationDocument, RecordQuery};
use crate::error::{MutationFailure, RegistryError};
use crate::mapping::{FieldMappingSpec, Record};
use crate::metrics::METRICS;
use crate::obs::{self, request_span};
use crate::Result;

/// Uniform result of every registry operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    /// `1` on success
    pub success: u8,
    pub data: Value,
}

impl ActionResult {
    pub fn ok(data: Value) -> Self {
        Self { success: 1, data }
    }

    pub fn is_success(&self) -> bool {
        self.success == 1
    }
}

/// Runs registry operations for one field mapping.
///
/// Holds no per-call state; share it freely behind an `Arc`.
#[derive(Clone)]
pub struct RegistryGqlManager {
    executor: Arc<dyn QueryExecutor>,
    correlation_log: Arc<dyn CorrelationLog>,
    builder: DocumentBuilder,
}

impl RegistryGqlManager {
    pub fn new(
        executor: Arc<dyn QueryExecutor>,
        correlation_log: Arc<dyn CorrelationLog>,
        spec: FieldMappingSpec,
    ) -> Self {
        Self {
            executor,
            correlation_log,
            builder: DocumentBuilder::new(spec),
        }
    }

    pub fn with_mutation_label(mut self, label: impl Into<String>) -> Self {
        self.builder = self.builder.with_mutation_label(label);
        self
    }

    pub fn spec(&self) -> &FieldMappingSpec {
        self.builder.spec()
    }

    /// Submit a mutation and resolve its outcome through the mutation log.
    ///
    /// Succeeds only when the backend acknowledged a `clientMutationId` and
    /// the log reports that id as successful.
    pub async fn mutate(
        &self,
        mutation_name: &str,
        record: &Record,
        use_defaults: bool,
    ) -> Result<ActionResult> {
        let mutation = self
            .builder
            .build_mutation(record, mutation_name, use_defaults)?;

        METRICS.inc_mutations_submitted();
        obs::emit_mutation_submitted(mutation_name, mutation.client_mutation_id.as_str());

        let outcome = self
            .submit(mutation_name, &mutation)
            .instrument(request_span("mutate", mutation_name))
            .await;
        if let Err(err) = &outcome {
            METRICS.inc_mutations_failed();
            obs::emit_mutation_failed(mutation_name, err);
        }
        outcome
    }

    async fn submit(&self, mutation_name: &str, mutation: &MutationDocument) -> Result<ActionResult> {
        let envelope = self.executor.execute(&mutation.text).await?;
        if let Some(errors) = envelope.errors() {
            return Err(MutationFailure::BackendErrors(errors.to_vec()).into());
        }

        let client_mutation_id = acknowledged_id(&envelope, mutation_name).ok_or_else(|| {
            MutationFailure::MissingClientMutationId {
                response: serde_json::to_string(&envelope)
                    .unwrap_or_else(|_| envelope.data.to_string()),
            }
        })?;
        if client_mutation_id != mutation.client_mutation_id {
            warn!(
                submitted = %mutation.client_mutation_id,
                acknowledged = %client_mutation_id,
                "backend acknowledged a different clientMutationId"
            );
        }

        let correlation = self
            .correlation_log
            .lookup_by_correlation_id(&client_mutation_id)
            .await?;
        match correlation {
            Some(entry) if entry.status == MutationStatus::Success => {
                obs::emit_mutation_resolved(mutation_name, client_mutation_id.as_str());
                Ok(ActionResult::ok(Value::Null))
            }
            Some(entry) if entry.status == MutationStatus::Error => Err(MutationFailure::Rejected {
                client_mutation_id: client_mutation_id.0,
                detail: entry
                    .error_detail
                    .unwrap_or_else(|| "no error detail recorded".to_string()),
            }
            .into()),
            Some(entry) => Err(MutationFailure::Unresolved {
                client_mutation_id: client_mutation_id.0,
                status: Some(entry.status),
            }
            .into()),
            None => Err(MutationFailure::Unresolved {
                client_mutation_id: client_mutation_id.0,
                status: None,
            }
            .into()),
        }
    }

    /// List records matching the query filters, one page at a time.
    ///
    /// `data` holds `entries`, `count` (the connection's `totalCount`) and
    /// `hasNextPage`.
    pub async fn retrieve_filtered_records(&self, query: &ListQuery) -> Result<ActionResult> {
        let document = self.builder.build_list_query(query)?;
        let envelope = self
            .execute_query(&document)
            .instrument(request_span("list", &query.query_name))
            .await?;

        let page = page_info(&envelope, &query.query_name)?;
        let records = extract_records(&envelope, &query.query_name).collect::<Result<Vec<_>>>()?;
        let entries = self.spec().to_external_representation(records);
        obs::emit_query_executed(&query.query_name, entries.len());

        Ok(ActionResult::ok(json!({
            "entries": entries,
            "count": page.total_count,
            "hasNextPage": page.has_next_page,
        })))
    }

    /// Fetch records by filter or cursor.
    ///
    /// With `only_first`, `data` is the first record when there is one;
    /// otherwise it is the list of all decoded records.
    pub async fn get_record(&self, query: &RecordQuery) -> Result<ActionResult> {
        let document = self.builder.build_record_query(query)?;
        let envelope = self
            .execute_query(&document)
            .instrument(request_span("get", &query.query_name))
            .await?;

        let records = extract_records(&envelope, &query.query_name).collect::<Result<Vec<_>>>()?;
        let records = if query.skip_mapping {
            records
        } else {
            self.spec().to_external_representation(records)
        };
        obs::emit_query_executed(&query.query_name, records.len());

        let data = if query.only_first && !records.is_empty() {
            records
                .into_iter()
                .next()
                .map(Value::Object)
                .unwrap_or(Value::Null)
        } else {
            Value::Array(records.into_iter().map(Value::Object).collect())
        };
        Ok(ActionResult::ok(data))
    }

    async fn execute_query(&self, document: &str) -> Result<ResponseEnvelope> {
        METRICS.inc_queries();
        debug!(bytes = document.len(), "executing query");
        let envelope = self.executor.execute(document).await?;
        if let Some(errors) = envelope.errors() {
            return Err(RegistryError::Backend {
                errors: errors.to_vec(),
            });
        }
        Ok(envelope)
    }
}

fn acknowledged_id(envelope: &ResponseEnvelope, mutation_name: &str) -> Option<ClientMutationId> {
    envelope
        .root(mutation_name)
        .and_then(|payload| payload.get("clientMutationId"))
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(ClientMutationId::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_result_serializes_success_as_int() {
        let value = serde_json::to_value(ActionResult::ok(Value::Null)).unwrap();
        assert_eq!(value, json!({"success": 1, "data": null}));
    }

    #[test]
    fn acknowledged_id_ignores_blank_ids() {
        let envelope =
            ResponseEnvelope::from_data(json!({"createPerson": {"clientMutationId": ""}}));
        assert!(acknowledged_id(&envelope, "createPerson").is_none());

        let envelope =
            ResponseEnvelope::from_data(json!({"createPerson": {"clientMutationId": "abc"}}));
        assert_eq!(
            acknowledged_id(&envelope, "createPerson"),
            Some(ClientMutationId::from("abc"))
        );
    }
}
