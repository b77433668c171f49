//! Search engine client that logs requests instead of sending them.

use async_trait::async_trait;
use tracing::info;

use crate::errors::SearchError;
use crate::interfaces::SearchEngineClient;
use crate::types::{AliasAction, IndexDefinition};

/// Logs every engine request and reports success without contacting a
/// cluster. Lookups come back empty, so a run behaves as if the alias were
/// unbound and no dated indices existed.
#[derive(Debug, Default, Clone)]
pub struct DryRunSearchClient;

impl DryRunSearchClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SearchEngineClient for DryRunSearchClient {
    async fn create_index(
        &self,
        name: &str,
        definition: &IndexDefinition,
    ) -> Result<(), SearchError> {
        let body =
            serde_json::to_string(definition).map_err(|e| SearchError::parse(e.to_string()))?;
        info!(index = %name, body = %body, "[dry run] create index");
        Ok(())
    }

    async fn bulk(&self, body: &str) -> Result<(), SearchError> {
        info!(lines = body.lines().count(), body = %body, "[dry run] bulk");
        Ok(())
    }

    async fn get_alias_binding(&self, alias: &str) -> Result<Vec<String>, SearchError> {
        info!(alias = %alias, "[dry run] alias lookup");
        Ok(Vec::new())
    }

    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<(), SearchError> {
        let body = serde_json::to_string(actions).map_err(|e| SearchError::parse(e.to_string()))?;
        info!(actions = %body, "[dry run] update aliases");
        Ok(())
    }

    async fn list_indices_matching(&self, pattern: &str) -> Result<Vec<String>, SearchError> {
        info!(pattern = %pattern, "[dry run] list indices");
        Ok(Vec::new())
    }

    async fn delete_indices(&self, names: &[String]) -> Result<(), SearchError> {
        info!(indices = ?names, "[dry run] delete indices");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_dry_run_accepts_everything() {
        let client = DryRunSearchClient::new();
        let definition = IndexDefinition {
            settings: json!({ "number_of_shards": 1 }),
            mappings: json!({ "properties": {} }),
        };

        client.create_index("products-1", &definition).await.unwrap();
        client
            .bulk("{\"index\":{\"_index\":\"products-1\",\"_id\":\"1\"}}\n{}\n")
            .await
            .unwrap();
        client
            .update_aliases(&[AliasAction::add("products", "products-1")])
            .await
            .unwrap();
        client.delete_indices(&["products-0".to_string()]).await.unwrap();

        assert!(client.get_alias_binding("products").await.unwrap().is_empty());
        assert!(client
            .list_indices_matching("products-20*")
            .await
            .unwrap()
            .is_empty());
    }
}
