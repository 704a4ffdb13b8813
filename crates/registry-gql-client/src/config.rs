//! Endpoint configuration
//!
//! Read from the environment by default:
//! - `REGISTRY_GQL_ENDPOINT`: GraphQL endpoint URL
//! - `REGISTRY_GQL_TOKEN`: bearer token, optional
//! - `REGISTRY_GQL_TIMEOUT_SECS`: request timeout in seconds

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::Result;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/api/graphql";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where and how to reach the GraphQL backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// GraphQL endpoint URL
    pub endpoint: String,
    /// Bearer token (optional for anonymous backends)
    pub token: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        EndpointConfig {
            endpoint: std::env::var("REGISTRY_GQL_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            token: std::env::var("REGISTRY_GQL_TOKEN")
                .ok()
                .filter(|token| !token.is_empty()),
            timeout: Duration::from_secs(
                std::env::var("REGISTRY_GQL_TIMEOUT_SECS")
                    .ok()
                    .and_then(|secs| secs.parse().ok())
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        }
    }
}

impl EndpointConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Config for a specific endpoint, ignoring the environment
    pub fn new(endpoint: &str) -> Self {
        EndpointConfig {
            endpoint: endpoint.to_string(),
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Set bearer token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Set per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reject endpoints that are not http(s) URLs.
    pub fn validate(&self) -> Result<()> {
        let scheme_ok = self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://");
        if !scheme_ok {
            return Err(ClientError::InvalidConfig(format!(
                "endpoint `{}` is not an http(s) URL",
                self.endpoint
            )));
        }
        if self.timeout.is_zero() {
            return Err(ClientError::InvalidConfig("timeout must be positive".to_string()));
        }
        Ok(())
    }
}
