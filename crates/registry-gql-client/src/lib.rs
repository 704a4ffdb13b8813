//! Registry-GQL Client: HTTP collaborators for registry-gql-core
//!
//! - `GraphqlHttpClient`: `QueryExecutor` posting documents with `reqwest`
//! - `GraphqlMutationLog`: `CorrelationLog` over the backend's `mutationLogs` query
//! - `EndpointConfig`: endpoint, bearer token and timeout, from the environment

pub mod config;
mod error;
pub mod http;
pub mod mutation_log;

pub use config::EndpointConfig;
pub use error::ClientError;
pub use http::GraphqlHttpClient;
pub use mutation_log::GraphqlMutationLog;

/// Result type for registry-gql-client operations
pub type Result<T> = std::result::Result<T, ClientError>;
