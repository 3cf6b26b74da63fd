use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use kpilens_core::daterange::DateRangeToken;
use kpilens_posthog::RequestCache;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct KpiParams {
    pub range: Option<String>,
    pub compare: Option<String>,
}

fn parse_compare(raw: Option<&str>) -> Result<bool, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(false),
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => Ok(true),
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => Ok(false),
        Some(_) => Err(AppError::BadRequest(
            "compare must be true or false".to_string(),
        )),
    }
}

/// `GET /api/tenants/{tenant_id}/kpis?range=7d&compare=true`
///
/// Unknown range tokens fall back to `7d`. Upstream failures are reported in
/// `data.meta.errors`; the response is `200` whenever the tenant exists.
#[tracing::instrument(skip(state, params))]
pub async fn get_kpis(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
    Query(params): Query<KpiParams>,
) -> Result<impl IntoResponse, AppError> {
    let compare = parse_compare(params.compare.as_deref())?;
    let tenant = state
        .tenants
        .get_tenant(&tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("tenant {tenant_id} not found")))?;

    let range = params
        .range
        .as_deref()
        .unwrap_or(DateRangeToken::default().as_str())
        .to_string();

    let mut cache = RequestCache::new();
    let result = state
        .assembler
        .assemble(&tenant, &range, compare, &mut cache)
        .await;

    if !result.meta.errors.is_empty() {
        tracing::warn!(
            tenant_id = %tenant_id,
            failed = result.meta.errors.len(),
            "KPI assembly finished with partial failures"
        );
    }

    Ok(Json(json!({ "data": result })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_flag_parsing() {
        assert!(!parse_compare(None).expect("absent"));
        assert!(parse_compare(Some("true")).expect("true"));
        assert!(parse_compare(Some("1")).expect("1"));
        assert!(!parse_compare(Some("FALSE")).expect("false"));
        assert!(parse_compare(Some("yes please")).is_err());
    }
}
