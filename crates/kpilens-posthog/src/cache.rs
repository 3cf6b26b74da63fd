use std::collections::HashMap;

use serde_json::Value;

use kpilens_core::{query::ConcreteQuery, upstream::UpstreamError};

pub type Outcome = Result<Value, UpstreamError>;

/// Upstream outcomes for one KPI request, keyed by query content.
///
/// Lives no longer than the request that created it, so there is no expiry
/// and no cross-tenant sharing.
#[derive(Debug, Default)]
pub struct RequestCache {
    outcomes: HashMap<String, Outcome>,
}

impl RequestCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, query: &ConcreteQuery) -> Option<&Outcome> {
        self.outcomes.get(&query.cache_key())
    }

    pub fn get_by_key(&self, key: &str) -> Option<&Outcome> {
        self.outcomes.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.outcomes.contains_key(key)
    }

    pub fn insert(&mut self, key: String, outcome: Outcome) {
        self.outcomes.insert(key, outcome);
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kpilens_core::{
        daterange::resolve,
        query::{build, BuildOptions, QueryTemplate},
    };
    use serde_json::json;

    #[test]
    fn identical_queries_share_an_entry() {
        let template = QueryTemplate::new(json!({ "kind": "TrendsQuery" }));
        let a = build(&template, &resolve("7d"), BuildOptions::default());
        let b = build(&template, &resolve("7d"), BuildOptions::default());

        let mut cache = RequestCache::new();
        cache.insert(a.cache_key(), Ok(json!({ "results": [] })));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&b), Some(&Ok(json!({ "results": [] }))));
    }

    #[test]
    fn failures_are_cached_too() {
        let mut cache = RequestCache::new();
        cache.insert("k".to_string(), Err(UpstreamError::MissingProjectId));
        assert!(cache.contains_key("k"));
        assert_eq!(cache.get_by_key("k"), Some(&Err(UpstreamError::MissingProjectId)));
        assert!(!cache.is_empty());
    }
}
