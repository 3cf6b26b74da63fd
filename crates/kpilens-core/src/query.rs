//! Turning a tenant's stored query template into a concrete upstream query.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use crate::daterange::DateFilter;

/// Query kinds that accept `compareFilter` upstream. Attaching it to anything
/// else makes the upstream reject the whole request.
const COMPARE_ALLOW_LIST: [QueryKind; 3] = [
    QueryKind::Trends,
    QueryKind::Stickiness,
    QueryKind::Paths,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKind {
    Trends,
    Funnels,
    Retention,
    Lifecycle,
    Stickiness,
    Paths,
    HogQL,
    Other(String),
}

impl QueryKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "TrendsQuery" => Self::Trends,
            "FunnelsQuery" => Self::Funnels,
            "RetentionQuery" => Self::Retention,
            "LifecycleQuery" => Self::Lifecycle,
            "StickinessQuery" => Self::Stickiness,
            "PathsQuery" => Self::Paths,
            "HogQLQuery" => Self::HogQL,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn supports_comparison(&self) -> bool {
        COMPARE_ALLOW_LIST.contains(self)
    }
}

/// A tenant-owned query tree. Shared read-only across requests.
///
/// The tree is either a bare query (`{"kind": "FunnelsQuery", ...}`) or a
/// wrapper node carrying the query under `source`
/// (`{"kind": "InsightVizNode", "source": {"kind": "TrendsQuery", ...}}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryTemplate(Value);

impl QueryTemplate {
    pub fn new(tree: Value) -> Self {
        Self(tree)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// The node that carries the actual query: `source` when present,
    /// otherwise the root.
    fn query_node(&self) -> Option<&Map<String, Value>> {
        let root = self.0.as_object()?;
        match root.get("source").and_then(Value::as_object) {
            Some(source) => Some(source),
            None => Some(root),
        }
    }

    pub fn kind(&self) -> Option<QueryKind> {
        self.query_node()?
            .get("kind")
            .and_then(Value::as_str)
            .map(QueryKind::parse)
    }

    /// Reject trees that cannot be turned into a query at all.
    pub fn validate(&self) -> Result<QueryKind, String> {
        if !self.0.is_object() {
            return Err("query template must be a JSON object".to_string());
        }
        self.kind()
            .ok_or_else(|| "query template has no `kind`".to_string())
    }

    /// Whether the upstream can answer both periods from a single query.
    pub fn supports_comparison(&self) -> bool {
        self.kind().is_some_and(|k| k.supports_comparison())
    }

    /// HogQL templates embed their own date bounds and cannot be re-dated.
    pub fn is_date_bound(&self) -> bool {
        matches!(self.kind(), Some(QueryKind::HogQL))
    }

    /// `retentionFilter.cumulative` on a retention query.
    pub fn is_cumulative_retention(&self) -> bool {
        self.query_node()
            .and_then(|node| node.get("retentionFilter"))
            .and_then(|filter| filter.get("cumulative"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    pub compare: bool,
}

/// A query ready to be posted upstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConcreteQuery(Value);

impl ConcreteQuery {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Stable identity for request-scoped deduplication.
    pub fn cache_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}

fn apply_date_range(node: &mut Map<String, Value>, filter: &DateFilter, compare: bool) {
    let kind = node
        .get("kind")
        .and_then(Value::as_str)
        .map(QueryKind::parse);

    node.insert("dateRange".to_string(), json!(filter));

    if compare && kind.as_ref().is_some_and(QueryKind::supports_comparison) {
        node.insert("compareFilter".to_string(), json!({ "compare": true }));
    } else {
        node.remove("compareFilter");
    }
}

/// Produce a concrete query from `template` for the given window.
///
/// The template is cloned before any change, so one template can back any
/// number of concurrent requests. `compareFilter` is only ever attached to
/// allow-listed query kinds; HogQL templates are returned as-is.
pub fn build(template: &QueryTemplate, filter: &DateFilter, options: BuildOptions) -> ConcreteQuery {
    if template.is_date_bound() {
        return ConcreteQuery(template.0.clone());
    }

    let mut tree = template.0.clone();
    if let Some(root) = tree.as_object_mut() {
        let wrapped = root.get("source").is_some_and(Value::is_object);
        if wrapped {
            root.remove("compareFilter");
            if let Some(source) = root.get_mut("source").and_then(Value::as_object_mut) {
                apply_date_range(source, filter, options.compare);
            }
        } else {
            apply_date_range(root, filter, options.compare);
        }
    }
    ConcreteQuery(tree)
}
