use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use kpilens_core::{family::MetricFamily, query::QueryTemplate, upstream::ProjectCredentials};

/// Per-tenant connection details and query templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantConfig {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub api_key: String,
    /// A family mapped to `null` (or left out) is not configured for this
    /// tenant and is omitted from its KPI object.
    #[serde(default)]
    pub query_templates: BTreeMap<MetricFamily, Option<QueryTemplate>>,
}

impl TenantConfig {
    pub fn credentials(&self) -> ProjectCredentials {
        ProjectCredentials {
            project_id: self.project_id.clone(),
            api_key: self.api_key.clone(),
        }
    }

    /// Configured families with their templates, in family order.
    pub fn configured_families(&self) -> impl Iterator<Item = (MetricFamily, &QueryTemplate)> {
        self.query_templates
            .iter()
            .filter_map(|(family, template)| template.as_ref().map(|t| (*family, t)))
    }
}

/// Source of tenant configuration.
///
/// The server ships a JSON-file implementation; a database-backed store can
/// replace it without touching the KPI assembly path.
#[async_trait]
pub trait TenantStore: Send + Sync + 'static {
    async fn get_tenant(&self, tenant_id: &str) -> anyhow::Result<Option<TenantConfig>>;
    async fn list_tenant_ids(&self) -> anyhow::Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_templates_are_not_configured() {
        let tenant: TenantConfig = serde_json::from_value(serde_json::json!({
            "projectId": "4242",
            "apiKey": "phx_secret",
            "queryTemplates": {
                "traffic": { "kind": "TrendsQuery" },
                "funnel": null
            }
        }))
        .expect("tenant");

        let families: Vec<MetricFamily> = tenant.configured_families().map(|(f, _)| f).collect();
        assert_eq!(families, vec![MetricFamily::Traffic]);
        assert_eq!(tenant.credentials().project_id, "4242");
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let tenant: TenantConfig =
            serde_json::from_value(serde_json::json!({})).expect("tenant");
        assert!(tenant.api_key.is_empty());
        assert_eq!(tenant.configured_families().count(), 0);
    }
}
