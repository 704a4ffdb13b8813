//! Structured events for registry operations.
//!
//! Every event carries an `event` field (`query.executed`, `mutation.submitted`,
//! `mutation.resolved`, `mutation.failed`, `mapping.rejected`) so log
//! pipelines can filter on it.

use tracing::{debug, info, warn, Span};

/// Span for one registry operation, meant for `Instrument::instrument`.
///
/// ```ignore
/// async { .. }.instrument(request_span("list", "persons")).await
/// // events inside are tagged with operation=list target=persons
/// ```
pub fn request_span(operation: &str, target: &str) -> Span {
    tracing::info_span!("registry.request", operation = %operation, target = %target)
}

pub fn emit_query_executed(query_name: &str, records: usize) {
    info!(event = "query.executed", query = %query_name, records = records);
}

pub fn emit_mutation_submitted(mutation_name: &str, client_mutation_id: &str) {
    info!(
        event = "mutation.submitted",
        mutation = %mutation_name,
        client_mutation_id = %client_mutation_id,
    );
}

pub fn emit_mutation_resolved(mutation_name: &str, client_mutation_id: &str) {
    info!(
        event = "mutation.resolved",
        mutation = %mutation_name,
        client_mutation_id = %client_mutation_id,
    );
}

pub fn emit_mutation_failed(mutation_name: &str, error: &dyn std::fmt::Display) {
    warn!(event = "mutation.failed", mutation = %mutation_name, error = %error);
}

pub fn emit_mapping_rejected(field: &str) {
    debug!(event = "mapping.rejected", field = %field);
}
