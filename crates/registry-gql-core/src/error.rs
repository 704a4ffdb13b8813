//! Error types for registry-gql-core

use thiserror::Error;

use crate::collaborators::{GraphqlError, MutationStatus};

/// Errors raised by the query-execution and correlation-log collaborators.
#[derive(Error, Debug)]
pub enum ExecutorError {
    /// The request never produced a response
    #[error("transport failure: {0}")]
    Transport(String),

    /// The backend answered with a non-success HTTP status
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be parsed as an envelope
    #[error("could not decode backend response: {0}")]
    Decode(String),
}

/// Why a submitted mutation is not considered successful.
#[derive(Error, Debug)]
pub enum MutationFailure {
    /// The envelope carried top-level `errors`
    #[error("backend rejected mutation: {}", join_messages(.0))]
    BackendErrors(Vec<GraphqlError>),

    /// The envelope had no `clientMutationId` for the mutation
    #[error("invalid mutation data, expected data.clientMutationId, mutation result: {response}")]
    MissingClientMutationId { response: String },

    /// The mutation log recorded an error for this correlation id
    #[error("mutation {client_mutation_id} failed: {detail}")]
    Rejected {
        client_mutation_id: String,
        detail: String,
    },

    /// The mutation log has no final outcome for this correlation id yet
    #[error("mutation {client_mutation_id} unresolved (status: {})", describe_status(.status))]
    Unresolved {
        client_mutation_id: String,
        status: Option<MutationStatus>,
    },
}

/// Failures converting a record into an output format.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("unknown output format: {format}")]
    UnsupportedFormat { format: String },

    #[error("field name `{name}` cannot be rendered as an XML element")]
    InvalidElementName { name: String },
}

/// Errors that can occur while translating and executing registry operations
#[derive(Error, Debug)]
pub enum RegistryError {
    /// A request field is neither mapped, special, nor meta
    #[error(
        "unsupported field: `{field}`. allowed fields for registry: {allowed_fields:?} {special_fields:?}"
    )]
    Mapping {
        field: String,
        allowed_fields: Vec<String>,
        special_fields: Vec<String>,
    },

    #[error(transparent)]
    Mutation(#[from] MutationFailure),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// An identifier could not be decoded
    #[error("invalid identifier `{value}`: {reason}")]
    InvalidIdentifier { value: String, reason: String },

    #[error("unknown ordering `{value}`, expected `ascending` or `descending`")]
    InvalidOrdering { value: String },

    /// `page * page_size` does not fit an offset
    #[error("page {page} with page size {page_size} is out of range")]
    InvalidPage { page: u64, page_size: u64 },

    /// The response envelope lacks a required connection part
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("query execution failed: {0}")]
    Execution(#[from] ExecutorError),

    /// A read query came back with top-level `errors`
    #[error("backend rejected query: {}", join_messages(.errors))]
    Backend { errors: Vec<GraphqlError> },

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn join_messages(errors: &[GraphqlError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

fn describe_status(status: &Option<MutationStatus>) -> String {
    match status {
        Some(status) => status.to_string(),
        None => "not recorded".to_string(),
    }
}
