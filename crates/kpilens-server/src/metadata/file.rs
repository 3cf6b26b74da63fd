use std::{collections::BTreeMap, path::Path};

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{TenantConfig, TenantStore};

#[derive(Debug, Deserialize)]
struct TenantsDocument {
    #[serde(default)]
    tenants: BTreeMap<String, TenantConfig>,
}

/// Tenant store backed by a JSON document read once at startup:
///
/// ```json
/// { "tenants": { "acme": { "projectId": "1", "apiKey": "phx_...", "queryTemplates": {} } } }
/// ```
#[derive(Debug, Default)]
pub struct FileTenantStore {
    tenants: BTreeMap<String, TenantConfig>,
}

impl FileTenantStore {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading tenants file {}", path.display()))?;
        let document: Value = serde_json::from_str(&raw)
            .with_context(|| format!("parsing tenants file {}", path.display()))?;
        Self::from_document(document)
    }

    pub fn from_document(document: Value) -> anyhow::Result<Self> {
        let document: TenantsDocument =
            serde_json::from_value(document).context("invalid tenants document")?;
        Ok(Self {
            tenants: document.tenants,
        })
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}

#[async_trait]
impl TenantStore for FileTenantStore {
    async fn get_tenant(&self, tenant_id: &str) -> anyhow::Result<Option<TenantConfig>> {
        Ok(self.tenants.get(tenant_id).cloned())
    }

    async fn list_tenant_ids(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.tenants.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kpilens_core::family::MetricFamily;
    use serde_json::json;

    fn document() -> Value {
        json!({
            "tenants": {
                "acme": {
                    "projectId": "1",
                    "apiKey": "phx_acme",
                    "queryTemplates": { "traffic": { "kind": "TrendsQuery" } }
                },
                "globex": { "projectId": "2", "apiKey": "phx_globex" }
            }
        })
    }

    #[tokio::test]
    async fn looks_up_tenants_by_id() {
        let store = FileTenantStore::from_document(document()).expect("store");
        assert_eq!(store.len(), 2);

        let acme = store.get_tenant("acme").await.expect("lookup").expect("acme");
        let families: Vec<_> = acme.configured_families().map(|(f, _)| f).collect();
        assert_eq!(families, vec![MetricFamily::Traffic]);

        assert!(store.get_tenant("initech").await.expect("lookup").is_none());
        assert_eq!(
            store.list_tenant_ids().await.expect("ids"),
            vec!["acme".to_string(), "globex".to_string()]
        );
    }

    #[test]
    fn unknown_family_keys_are_rejected() {
        let err = FileTenantStore::from_document(json!({
            "tenants": { "acme": { "queryTemplates": { "revenue": { "kind": "TrendsQuery" } } } }
        }));
        assert!(err.is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(FileTenantStore::load("/nonexistent/kpilens-tenants.json").is_err());
    }
}
