//! Error types for registry-gql-client

use registry_gql_core::ExecutorError;
use thiserror::Error;

/// Errors raised while setting up a client
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP client could not be built or reached
    #[error("HTTP error: {0}")]
    Http(String),

    /// Endpoint configuration is unusable
    #[error("invalid endpoint configuration: {0}")]
    InvalidConfig(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Http(err.to_string())
    }
}

/// Classify a request failure for the executor seam.
pub(crate) fn transport(err: reqwest::Error) -> ExecutorError {
    if err.is_decode() {
        ExecutorError::Decode(err.to_string())
    } else {
        ExecutorError::Transport(err.to_string())
    }
}
