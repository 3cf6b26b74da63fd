use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use kpilens_core::{
    config::Config,
    query::ConcreteQuery,
    upstream::{ProjectCredentials, UpstreamError, UpstreamQuery},
};

/// HTTP client for the PostHog query endpoint.
///
/// Queries are posted as `{"query": <tree>}` to
/// `{host}/api/projects/{project_id}/query` with the tenant's personal API
/// key as a bearer token.
#[derive(Clone)]
pub struct PosthogClient {
    client: Client,
    host: Url,
}

impl PosthogClient {
    pub fn new(host: &str, timeout: Duration) -> anyhow::Result<Self> {
        let host = Url::parse(host.trim_end_matches('/'))?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, host })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(&config.posthog_host, config.upstream_timeout())
    }

    fn query_url(&self, project_id: &str) -> Result<Url, UpstreamError> {
        let mut url = self.host.clone();
        url.path_segments_mut()
            .map_err(|_| UpstreamError::Transport(format!("invalid host: {}", self.host)))?
            .pop_if_empty()
            .extend(["api", "projects", project_id, "query"]);
        Ok(url)
    }
}

/// Best human-readable message in an error body: `detail`, then `error`,
/// then the raw text.
fn error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            ["detail", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(Value::as_str))
        })
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

/// A 200 response can still carry a query error in its `error` field.
fn logical_error(payload: &Value) -> Option<String> {
    match payload.get("error")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(message) => Some(message.clone()),
        other => Some(
            payload
                .get("detail")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| other.to_string()),
        ),
    }
}

#[async_trait::async_trait]
impl UpstreamQuery for PosthogClient {
    async fn run(
        &self,
        credentials: &ProjectCredentials,
        query: &ConcreteQuery,
    ) -> Result<Value, UpstreamError> {
        credentials.validate()?;
        let url = self.query_url(credentials.project_id.trim())?;
        debug!(%url, key = %query.cache_key(), "posting query");

        let resp = self
            .client
            .post(url)
            .bearer_auth(credentials.api_key.trim())
            .json(&json!({ "query": query }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    UpstreamError::Transport("request timed out".to_string())
                } else {
                    UpstreamError::Transport(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let payload: Value = resp
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;
        match logical_error(&payload) {
            Some(message) => Err(UpstreamError::Logical(message)),
            None => Ok(payload),
        }
    }
}
