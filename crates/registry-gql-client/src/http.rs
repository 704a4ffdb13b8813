//! GraphQL over HTTP
//!
//! Posts `{"query": <document>}` to the configured endpoint and parses the
//! response envelope.

use async_trait::async_trait;
use registry_gql_core::{ExecutorError, ExecutorResult, QueryExecutor, ResponseEnvelope};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::config::EndpointConfig;
use crate::error::transport;
use crate::Result;

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
}

/// [`QueryExecutor`] backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct GraphqlHttpClient {
    config: EndpointConfig,
    http_client: reqwest::Client,
}

impl GraphqlHttpClient {
    pub fn new(config: EndpointConfig) -> Result<Self> {
        config.validate()?;
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("registry-gql/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;

        Ok(GraphqlHttpClient {
            config,
            http_client,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(EndpointConfig::from_env())
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }
}

#[async_trait]
impl QueryExecutor for GraphqlHttpClient {
    #[instrument(skip_all, fields(bytes = document.len()))]
    async fn execute(&self, document: &str) -> ExecutorResult<ResponseEnvelope> {
        let mut request = self
            .http_client
            .post(&self.config.endpoint)
            .json(&GraphqlRequest { query: document });
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        debug!(endpoint = %self.config.endpoint, status = status.as_u16(), "backend responded");

        if status.is_success() {
            return serde_json::from_str(&body).map_err(|e| ExecutorError::Decode(e.to_string()));
        }

        // GraphQL servers report validation failures as 4xx with an errors array.
        match serde_json::from_str::<ResponseEnvelope>(&body) {
            Ok(envelope) if envelope.errors().is_some() => Ok(envelope),
            _ => {
                warn!(status = status.as_u16(), "backend request failed");
                Err(ExecutorError::Status {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}
