//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchEngineClient`
//! using the OpenSearch Rust client.

use async_trait::async_trait;
use opensearch::{
    auth::Credentials,
    cat::{CatAliasesParts, CatIndicesParts},
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesDeleteParts},
    BulkParts, OpenSearch,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::config::TargetProfile;
use crate::errors::SearchError;
use crate::interfaces::SearchEngineClient;
use crate::types::{AliasAction, IndexDefinition};

/// Number of failed bulk items quoted in a `BulkIndexError` message.
const MAX_REPORTED_FAILURES: usize = 5;

/// OpenSearch client implementation.
///
/// # Example
///
/// ```ignore
/// let profile = TargetProfile::new("prod", "http://localhost:9200");
/// let client = OpenSearchClient::new(&profile)?;
/// client.update_aliases(&[AliasAction::add("products", "products-20210101000000")]).await?;
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client for the given profile.
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(SearchError)` - If the URL is invalid or transport setup fails
    pub fn new(profile: &TargetProfile) -> Result<Self, SearchError> {
        let parsed_url =
            Url::parse(&profile.url).map_err(|e| SearchError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let mut builder = TransportBuilder::new(conn_pool).disable_proxy();
        if let (Some(username), Some(password)) = (&profile.username, &profile.password) {
            builder = builder.auth(Credentials::Basic(username.clone(), password.clone()));
        }
        let transport = builder
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        info!(
            url = %profile.url,
            profile = %profile.name,
            authenticated = profile.username.is_some(),
            "Created OpenSearch client"
        );

        Ok(Self {
            client: OpenSearch::new(transport),
        })
    }

    /// Read the body of a failed response for the error message.
    async fn failure_text(response: Response) -> String {
        let status = response.status_code();
        let body = response.text().await.unwrap_or_default();
        format!("status {}: {}", status, body)
    }

    /// Inspect a bulk response body for item-level failures.
    fn check_bulk_response(body: &Value) -> Result<usize, SearchError> {
        let items = body["items"].as_array().map(Vec::as_slice).unwrap_or(&[]);

        if !body["errors"].as_bool().unwrap_or(false) {
            return Ok(items.len());
        }

        let failures: Vec<&Value> = items
            .iter()
            .filter_map(|item| item.as_object().and_then(|op| op.values().next()))
            .filter(|result| result.get("error").is_some())
            .collect();

        let reasons: Vec<String> = failures
            .iter()
            .take(MAX_REPORTED_FAILURES)
            .map(|result| {
                format!(
                    "{}: {}",
                    result["_id"].as_str().unwrap_or("?"),
                    result["error"]["reason"]
                        .as_str()
                        .unwrap_or_else(|| result["error"]["type"].as_str().unwrap_or("unknown"))
                )
            })
            .collect();

        Err(SearchError::bulk_index(format!(
            "{} of {} items failed: [{}]",
            failures.len(),
            items.len(),
            reasons.join("; ")
        )))
    }

    /// Extract the `index` column from a `_cat` JSON response.
    fn index_names(rows: &Value) -> Result<Vec<String>, SearchError> {
        let rows = rows
            .as_array()
            .ok_or_else(|| SearchError::parse("expected a JSON array from _cat"))?;

        rows.iter()
            .map(|row| {
                row["index"]
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| SearchError::parse(format!("row without index: {}", row)))
            })
            .collect()
    }
}

#[async_trait]
impl SearchEngineClient for OpenSearchClient {
    #[instrument(skip(self, definition))]
    async fn create_index(
        &self,
        name: &str,
        definition: &IndexDefinition,
    ) -> Result<(), SearchError> {
        let body =
            serde_json::to_value(definition).map_err(|e| SearchError::parse(e.to_string()))?;

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(name))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchError::index_creation(e.to_string()))?;

        if !response.status_code().is_success() {
            let message = Self::failure_text(response).await;
            error!(index = %name, error = %message, "Create index request failed");
            return Err(SearchError::index_creation(format!(
                "Create index {} failed with {}",
                name, message
            )));
        }

        info!(index = %name, "Index created");
        Ok(())
    }

    async fn bulk(&self, body: &str) -> Result<(), SearchError> {
        let lines: Vec<String> = body.lines().map(str::to_string).collect();
        let line_count = lines.len();

        let response = self
            .client
            .bulk(BulkParts::None)
            .body(lines)
            .send()
            .await
            .map_err(|e| SearchError::bulk_index(e.to_string()))?;

        if !response.status_code().is_success() {
            let message = Self::failure_text(response).await;
            error!(error = %message, "Bulk request failed");
            return Err(SearchError::bulk_index(format!("Bulk failed with {}", message)));
        }

        let result = response
            .json::<Value>()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        let accepted = Self::check_bulk_response(&result)?;
        debug!(lines = line_count, items = accepted, "Bulk request accepted");
        Ok(())
    }

    async fn get_alias_binding(&self, alias: &str) -> Result<Vec<String>, SearchError> {
        let response = self
            .client
            .cat()
            .aliases(CatAliasesParts::Name(&[alias]))
            .format("json")
            .send()
            .await
            .map_err(|e| SearchError::alias(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let message = Self::failure_text(response).await;
            return Err(SearchError::alias(format!(
                "Alias lookup for {} failed with {}",
                alias, message
            )));
        }

        let rows = response
            .json::<Value>()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;
        let indices = Self::index_names(&rows)?;

        debug!(alias = %alias, indices = ?indices, "Alias binding");
        Ok(indices)
    }

    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<(), SearchError> {
        let response = self
            .client
            .indices()
            .update_aliases()
            .body(json!({ "actions": actions }))
            .send()
            .await
            .map_err(|e| SearchError::alias(e.to_string()))?;

        if !response.status_code().is_success() {
            let message = Self::failure_text(response).await;
            error!(error = %message, "Alias update failed");
            return Err(SearchError::alias(format!("Alias update failed with {}", message)));
        }

        Ok(())
    }

    async fn list_indices_matching(&self, pattern: &str) -> Result<Vec<String>, SearchError> {
        let response = self
            .client
            .cat()
            .indices(CatIndicesParts::Index(&[pattern]))
            .format("json")
            .send()
            .await
            .map_err(|e| SearchError::cat(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let message = Self::failure_text(response).await;
            return Err(SearchError::cat(format!(
                "Listing {} failed with {}",
                pattern, message
            )));
        }

        let rows = response
            .json::<Value>()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;
        Self::index_names(&rows)
    }

    async fn delete_indices(&self, names: &[String]) -> Result<(), SearchError> {
        let names: Vec<&str> = names.iter().map(String::as_str).collect();

        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&names))
            .send()
            .await
            .map_err(|e| SearchError::delete(e.to_string()))?;

        if !response.status_code().is_success() {
            let message = Self::failure_text(response).await;
            error!(indices = ?names, error = %message, "Delete indices failed");
            return Err(SearchError::delete(format!(
                "Deleting {} failed with {}",
                names.join(","),
                message
            )));
        }

        info!(indices = ?names, "Indices deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_url() {
        let profile = TargetProfile::new("devel", "not a url");
        assert!(matches!(
            OpenSearchClient::new(&profile),
            Err(SearchError::ConnectionError(_))
        ));
    }

    #[test]
    fn test_new_with_credentials() {
        let profile =
            TargetProfile::new("prod", "https://search.example.com").with_credentials("u", "p");
        assert!(OpenSearchClient::new(&profile).is_ok());
    }

    #[test]
    fn test_check_bulk_response_success() {
        let body = json!({
            "took": 3,
            "errors": false,
            "items": [
                { "index": { "_id": "1", "status": 201 } },
                { "index": { "_id": "2", "status": 201 } }
            ]
        });

        assert_eq!(OpenSearchClient::check_bulk_response(&body).unwrap(), 2);
    }

    #[test]
    fn test_check_bulk_response_partial_failure() {
        let body = json!({
            "errors": true,
            "items": [
                { "index": { "_id": "1", "status": 201 } },
                {
                    "index": {
                        "_id": "2",
                        "status": 400,
                        "error": { "type": "mapper_parsing_exception", "reason": "failed to parse field [price]" }
                    }
                }
            ]
        });

        let err = OpenSearchClient::check_bulk_response(&body).unwrap_err();
        match err {
            SearchError::BulkIndexError(msg) => {
                assert!(msg.starts_with("1 of 2 items failed"));
                assert!(msg.contains("2: failed to parse field [price]"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_index_names() {
        let rows = json!([
            { "alias": "products", "index": "products-20210101000000" }
        ]);
        assert_eq!(
            OpenSearchClient::index_names(&rows).unwrap(),
            vec!["products-20210101000000".to_string()]
        );

        assert!(OpenSearchClient::index_names(&json!([])).unwrap().is_empty());
        assert!(OpenSearchClient::index_names(&json!({})).is_err());
        assert!(OpenSearchClient::index_names(&json!([{ "alias": "x" }])).is_err());
    }
}
