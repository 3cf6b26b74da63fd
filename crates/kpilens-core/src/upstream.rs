//! Boundary to the analytics backend that answers queries.

use serde_json::Value;
use thiserror::Error;

use crate::query::ConcreteQuery;

/// Personal API keys are issued with this prefix.
pub const API_KEY_PREFIX: &str = "phx_";

/// Project-scoped credentials for one tenant.
#[derive(Debug, Clone)]
pub struct ProjectCredentials {
    pub project_id: String,
    pub api_key: String,
}

impl ProjectCredentials {
    /// Shape check done before any network call. Project tokens (`phc_`)
    /// are write-only and rejected here.
    pub fn validate(&self) -> Result<(), UpstreamError> {
        let key = self.api_key.trim();
        if !key.starts_with(API_KEY_PREFIX) {
            let reason = if key.is_empty() {
                "no API key configured".to_string()
            } else {
                format!("key must start with `{API_KEY_PREFIX}`")
            };
            return Err(UpstreamError::InvalidApiKey(reason));
        }
        if self.project_id.trim().is_empty() {
            return Err(UpstreamError::MissingProjectId);
        }
        Ok(())
    }
}

/// Why an upstream call produced no payload.
///
/// `Clone` so a single outcome can be shared by every family that issued the
/// same query within one assembly pass.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UpstreamError {
    #[error("invalid API key: {0}")]
    InvalidApiKey(String),

    #[error("missing project id")]
    MissingProjectId,

    #[error("request failed: {0}")]
    Transport(String),

    #[error("upstream returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("upstream query error: {0}")]
    Logical(String),

    #[error("could not decode upstream response: {0}")]
    Decode(String),
}

/// Runs one concrete query and returns the raw JSON payload.
///
/// Implementations never panic or propagate transport errors any other way:
/// every failure is an [`UpstreamError`].
#[async_trait::async_trait]
pub trait UpstreamQuery: Send + Sync + 'static {
    async fn run(
        &self,
        credentials: &ProjectCredentials,
        query: &ConcreteQuery,
    ) -> Result<Value, UpstreamError>;
}
