use std::sync::Arc;

use futures_util::future::join_all;
use serde_json::Value;
use tracing::{info, warn};

use kpilens_core::{
    daterange::DateRangeToken,
    family::MetricFamily,
    kpi::KpiResult,
    query::{build, BuildOptions, ConcreteQuery},
    upstream::UpstreamQuery,
};
use kpilens_metadata::TenantConfig;

use crate::{
    cache::RequestCache,
    parsers::{empty_fragment, parse_family, ParseContext},
};

/// Everything needed to turn one family's upstream outcomes into a fragment.
struct Job {
    family: MetricFamily,
    current: String,
    /// Separately fetched prior period, for kinds that cannot compare
    /// in-query.
    previous: Option<String>,
    ctx: ParseContext,
}

/// Builds a tenant's [`KpiResult`] from its configured query templates.
#[derive(Clone)]
pub struct KpiAssembler {
    upstream: Arc<dyn UpstreamQuery>,
}

impl KpiAssembler {
    pub fn new(upstream: Arc<dyn UpstreamQuery>) -> Self {
        Self { upstream }
    }

    /// One assembly pass.
    ///
    /// Never fails: every configured family ends up in the result, with its
    /// empty fragment and a `meta.errors` entry when something went wrong.
    /// Outcomes already in `cache` are reused and new ones are added to it.
    pub async fn assemble(
        &self,
        tenant: &TenantConfig,
        token: &str,
        compare: bool,
        cache: &mut RequestCache,
    ) -> KpiResult {
        let range = DateRangeToken::parse(token);
        let mut result = KpiResult::new(range.as_str(), compare);
        let credentials = tenant.credentials();

        if let Err(e) = credentials.validate() {
            warn!(error = %e, "tenant credentials rejected, skipping upstream");
            for (family, _) in tenant.configured_families() {
                fail(&mut result, family, e.to_string());
            }
            return result;
        }

        let mut jobs = Vec::new();
        let mut pending: Vec<(String, ConcreteQuery)> = Vec::new();

        for (family, template) in tenant.configured_families() {
            if let Err(reason) = template.validate() {
                warn!(family = %family, %reason, "unusable query template");
                fail(&mut result, family, reason);
                continue;
            }

            let in_query = compare && template.supports_comparison();
            let query = build(template, &range.filter(), BuildOptions { compare });
            let current = enqueue(&mut pending, cache, query);
            let previous = if compare && !in_query && !template.is_date_bound() {
                let query = build(
                    template,
                    &range.comparison_filter(),
                    BuildOptions { compare: false },
                );
                Some(enqueue(&mut pending, cache, query))
            } else {
                None
            };

            jobs.push(Job {
                family,
                current,
                previous,
                ctx: ParseContext {
                    has_comparison: in_query,
                    range,
                    cumulative_retention: template.is_cumulative_retention(),
                },
            });
        }

        info!(
            families = jobs.len(),
            queries = pending.len(),
            range = range.as_str(),
            compare,
            "running KPI assembly pass"
        );

        let outcomes = join_all(
            pending
                .iter()
                .map(|(_, query)| self.upstream.run(&credentials, query)),
        )
        .await;
        for ((key, _), outcome) in pending.into_iter().zip(outcomes) {
            cache.insert(key, outcome);
        }

        for job in jobs {
            let current = match cache.get_by_key(&job.current) {
                Some(Ok(raw)) => raw,
                Some(Err(e)) => {
                    warn!(family = %job.family, error = %e, "upstream query failed");
                    fail(&mut result, job.family, e.to_string());
                    continue;
                }
                None => {
                    fail(&mut result, job.family, "query was not executed");
                    continue;
                }
            };
            let previous = job
                .previous
                .as_deref()
                .and_then(|key| previous_payload(cache, key, job.family));

            match parse_family(job.family, current, previous, job.ctx) {
                Ok(fragment) => result.set_family(job.family, fragment),
                Err(e) => fail(&mut result, job.family, e.to_string()),
            }
        }

        result
    }
}

/// Queue `query` unless its outcome is already cached or queued; returns its
/// cache key either way.
fn enqueue(
    pending: &mut Vec<(String, ConcreteQuery)>,
    cache: &RequestCache,
    query: ConcreteQuery,
) -> String {
    let key = query.cache_key();
    if !cache.contains_key(&key) && !pending.iter().any(|(queued, _)| *queued == key) {
        pending.push((key.clone(), query));
    }
    key
}

/// A failed prior-period fetch only drops the comparison fields.
fn previous_payload<'a>(
    cache: &'a RequestCache,
    key: &str,
    family: MetricFamily,
) -> Option<&'a Value> {
    match cache.get_by_key(key)? {
        Ok(raw) => Some(raw),
        Err(e) => {
            warn!(family = %family, error = %e, "previous-period query failed");
            None
        }
    }
}

fn fail(result: &mut KpiResult, family: MetricFamily, reason: impl Into<String>) {
    result.record_error(family, reason);
    result.set_family(family, empty_fragment(family).unwrap_or_default());
}
