use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use kpilens_posthog::PosthogClient;
use kpilens_server::{metadata::file::FileTenantStore, state::AppState};

/// `kpilens health`: liveness probe for Docker HEALTHCHECK.
///
/// Calls `GET http://localhost:$KPILENS_PORT/health`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("KPILENS_PORT").unwrap_or_else(|_| "3000".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) == Some("health") {
        run_health_check();
    }
    // Structured JSON logging. Level controlled via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kpilens=info".parse()?),
        )
        .json()
        .init();

    let cfg = kpilens_core::config::Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    let tenants = FileTenantStore::load(&cfg.tenants_path)?;
    if tenants.is_empty() {
        tracing::warn!(
            tenants_path = %cfg.tenants_path,
            "No tenants configured; every KPI request will return 404"
        );
    } else {
        info!(tenants = tenants.len(), "Tenant configuration loaded");
    }

    let upstream = PosthogClient::from_config(&cfg)?;
    info!(
        posthog_host = %cfg.posthog_host,
        timeout_secs = cfg.upstream_timeout_secs,
        "PostHog client ready"
    );

    let state = Arc::new(AppState::new(
        cfg.clone(),
        Arc::new(tenants),
        Arc::new(upstream),
    ));

    let addr = format!("0.0.0.0:{}", cfg.port);
    let app = kpilens_server::app::build_app(state);

    info!(port = cfg.port, "kpilens listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
