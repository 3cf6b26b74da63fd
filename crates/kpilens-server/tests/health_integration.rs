use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use kpilens_core::{
    config::Config,
    query::ConcreteQuery,
    upstream::{ProjectCredentials, UpstreamError, UpstreamQuery},
};
use kpilens_server::app::build_app;
use kpilens_server::metadata::{file::FileTenantStore, TenantConfig, TenantStore};
use kpilens_server::state::AppState;

struct UnreachableUpstream;

#[async_trait]
impl UpstreamQuery for UnreachableUpstream {
    async fn run(
        &self,
        _credentials: &ProjectCredentials,
        _query: &ConcreteQuery,
    ) -> Result<Value, UpstreamError> {
        Err(UpstreamError::Transport("unreachable".to_string()))
    }
}

struct BrokenStore;

#[async_trait]
impl TenantStore for BrokenStore {
    async fn get_tenant(&self, _tenant_id: &str) -> anyhow::Result<Option<TenantConfig>> {
        anyhow::bail!("store offline")
    }

    async fn list_tenant_ids(&self) -> anyhow::Result<Vec<String>> {
        anyhow::bail!("store offline")
    }
}

async fn json_body(response: axum::http::Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("parse JSON")
}

fn health_request() -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build request")
}

// ============================================================
// Health check returns 200 when the tenant store is readable
// ============================================================
#[tokio::test]
async fn test_health_returns_200_with_tenant_count() {
    let tenants = FileTenantStore::from_document(json!({
        "tenants": { "acme": { "projectId": "1", "apiKey": "phx_a" } }
    }))
    .expect("tenants");
    let state = Arc::new(AppState::new(
        Config::default(),
        Arc::new(tenants),
        Arc::new(UnreachableUpstream),
    ));
    let app = build_app(state);

    let response = app.oneshot(health_request()).await.expect("request");
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["tenants"], 1);
}

// ============================================================
// Health check degrades when the tenant store fails
// ============================================================
#[tokio::test]
async fn test_health_returns_503_when_store_fails() {
    let state = Arc::new(AppState::new(
        Config::default(),
        Arc::new(BrokenStore),
        Arc::new(UnreachableUpstream),
    ));
    let app = build_app(state);

    let response = app.oneshot(health_request()).await.expect("request");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json = json_body(response).await;
    assert_eq!(json["status"], "degraded");
}

#[tokio::test]
async fn test_store_failure_on_kpis_is_internal_error() {
    let state = Arc::new(AppState::new(
        Config::default(),
        Arc::new(BrokenStore),
        Arc::new(UnreachableUpstream),
    ));
    let app = build_app(state);

    let request = Request::builder()
        .method("GET")
        .uri("/api/tenants/acme/kpis")
        .body(Body::empty())
        .expect("build request");
    let response = app.oneshot(request).await.expect("request");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "internal_error");
}
