use std::sync::Arc;

use kpilens_core::{config::Config, upstream::UpstreamQuery};
use kpilens_metadata::TenantStore;
use kpilens_posthog::KpiAssembler;

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
///
/// Nothing here is mutated after startup; per-request memoization lives in a
/// `RequestCache` owned by the handler.
pub struct AppState {
    pub config: Arc<Config>,
    pub tenants: Arc<dyn TenantStore>,
    pub assembler: KpiAssembler,
}

impl AppState {
    pub fn new(
        config: Config,
        tenants: Arc<dyn TenantStore>,
        upstream: Arc<dyn UpstreamQuery>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            tenants,
            assembler: KpiAssembler::new(upstream),
        }
    }
}
