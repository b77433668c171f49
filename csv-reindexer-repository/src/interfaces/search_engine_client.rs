//! Search engine client trait definition.
//!
//! This module defines the abstract interface for the index-lifecycle
//! operations the reindexer needs, allowing for different backend
//! implementations (OpenSearch, Elasticsearch, mocks in tests).

use async_trait::async_trait;

use crate::errors::SearchError;
use crate::types::{AliasAction, IndexDefinition};

/// Abstract interface for search engine operations.
///
/// Every call either succeeds or returns an error; implementations do not
/// retry. Callers needing timeouts must configure them on the transport.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
#[async_trait]
pub trait SearchEngineClient: Send + Sync {
    /// Create a physical index with the given settings and mappings.
    ///
    /// # Arguments
    ///
    /// * `name` - The physical index name
    /// * `definition` - Settings (shards, replicas, analysis) and mappings
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the engine acknowledged the index
    /// * `Err(SearchError::IndexCreationError)` - On any non-success response
    async fn create_index(
        &self,
        name: &str,
        definition: &IndexDefinition,
    ) -> Result<(), SearchError>;

    /// Send one bulk request.
    ///
    /// `body` is newline-delimited JSON alternating an action-metadata line
    /// and a document line, terminated by a newline.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If every item was accepted
    /// * `Err(SearchError::BulkIndexError)` - If the request failed or any item failed
    async fn bulk(&self, body: &str) -> Result<(), SearchError>;

    /// List the indices the alias currently resolves to.
    ///
    /// An alias that does not exist yields an empty list.
    async fn get_alias_binding(&self, alias: &str) -> Result<Vec<String>, SearchError>;

    /// Apply all alias actions in a single atomic request.
    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<(), SearchError>;

    /// List index names matching a wildcard pattern such as `products-20*`.
    async fn list_indices_matching(&self, pattern: &str) -> Result<Vec<String>, SearchError>;

    /// Delete all named indices in one call.
    async fn delete_indices(&self, names: &[String]) -> Result<(), SearchError>;
}
