//! Mutation-log lookups through the backend's `mutationLogs` connection.
//!
//! The backend records every mutation it receives under its
//! `clientMutationId` with a numeric status:
//!
//! | code | meaning |
//! |---|---|
//! | 0 | received, not processed yet |
//! | 1 | failed, `error` holds the detail |
//! | 2 | succeeded |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use registry_gql_core::arguments::quote;
use registry_gql_core::document::connection_query;
use registry_gql_core::{
    extract_records, ClientMutationId, CorrelationLog, ExecutorError, ExecutorResult,
    MutationCorrelation, MutationStatus, QueryExecutor, Record,
};
use serde_json::Value;
use tracing::{debug, instrument};

pub const MUTATION_LOG_QUERY: &str = "mutationLogs";

const LOG_FIELDS: &str = "clientMutationId status error requestDateTime";

/// [`CorrelationLog`] that queries the backend it shares an executor with
#[derive(Clone)]
pub struct GraphqlMutationLog {
    executor: Arc<dyn QueryExecutor>,
}

impl GraphqlMutationLog {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl CorrelationLog for GraphqlMutationLog {
    #[instrument(skip_all, fields(client_mutation_id = %id))]
    async fn lookup_by_correlation_id(
        &self,
        id: &ClientMutationId,
    ) -> ExecutorResult<Option<MutationCorrelation>> {
        let arguments = format!("clientMutationId: {}", quote(id.as_str()));
        let document = connection_query(MUTATION_LOG_QUERY, &arguments, LOG_FIELDS);
        let envelope = self.executor.execute(&document).await?;
        if let Some(errors) = envelope.errors() {
            let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
            return Err(ExecutorError::Decode(format!(
                "mutation log query failed: {}",
                messages.join("; ")
            )));
        }

        let entry = extract_records(&envelope, MUTATION_LOG_QUERY)
            .next()
            .transpose()
            .map_err(|e| ExecutorError::Decode(e.to_string()))?;
        let Some(entry) = entry else {
            debug!("no mutation log entry");
            return Ok(None);
        };
        parse_entry(id, &entry).map(Some)
    }
}

fn parse_entry(id: &ClientMutationId, entry: &Record) -> ExecutorResult<MutationCorrelation> {
    let status = match entry.get("status").and_then(status_code) {
        Some(0) => MutationStatus::Pending,
        Some(1) => MutationStatus::Error,
        Some(2) => MutationStatus::Success,
        _ => {
            return Err(ExecutorError::Decode(format!(
                "unknown mutation log status: {}",
                entry.get("status").unwrap_or(&Value::Null)
            )))
        }
    };
    let error_detail = match entry.get("error") {
        None | Some(Value::Null) => None,
        Some(Value::String(detail)) if detail.is_empty() => None,
        Some(Value::String(detail)) => Some(detail.clone()),
        Some(other) => Some(other.to_string()),
    };
    let recorded_at = entry
        .get("requestDateTime")
        .and_then(Value::as_str)
        .and_then(parse_timestamp);

    Ok(MutationCorrelation {
        client_mutation_id: id.clone(),
        status,
        error_detail,
        recorded_at,
    })
}

/// Graphene renders enum-like integers either as numbers or as `A_<n>` names.
fn status_code(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim_start_matches("A_").parse().ok(),
        _ => None,
    }
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}
