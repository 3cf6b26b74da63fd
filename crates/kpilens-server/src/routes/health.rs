use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::state::AppState;

/// `GET /health`: liveness check.
///
/// Returns `503 Service Unavailable` when the tenant store cannot be read.
///
/// Response shape:
/// ```json
/// { "status": "ok", "version": "0.1.0", "tenants": 3 }
/// ```
#[tracing::instrument(skip(state))]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.tenants.list_tenant_ids().await {
        Ok(ids) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "version": env!("CARGO_PKG_VERSION"),
                "tenants": ids.len()
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Health check: tenant store unreadable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "version": env!("CARGO_PKG_VERSION")
                })),
            )
                .into_response()
        }
    }
}
