use std::sync::Arc;

use axum::{http::HeaderValue, routing::get, Router};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{routes, state::AppState};

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(allowed))
    }
}

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// `TraceLayer` runs outermost; CORS is open unless `KPILENS_CORS_ORIGINS`
/// lists the dashboard origins.
pub fn build_app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/tenants/{tenant_id}/kpis", get(routes::kpis::get_kpis))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
