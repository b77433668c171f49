//! In-memory collaborators shared by the pipeline tests.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;
use uuid::Uuid;

use csv_reindexer_repository::{
    AliasAction, IndexDefinition, ObjectReader, ObjectStore, SearchEngineClient, SearchError,
    StorageError,
};
use csv_reindexer_shared::{
    real_index_name, IndexAction, IndexMapping, IngestionRequest, NotificationSettings,
    NotificationStep,
};

use crate::notifier::NotificationSink;

/// A request for alias `products` in profile `prod`, mapping `id`, `name`
/// and `tags`, splitting multi-values on `|`.
pub fn request(action: IndexAction) -> IngestionRequest {
    let data_time = "20210101000000";
    let file_name = format!("{}.{}.csv", data_time, action);
    IngestionRequest {
        run_id: Uuid::new_v4(),
        bucket: "bucket".to_string(),
        key: format!("data/prod/products/{}", file_name),
        root: "data".to_string(),
        config_dir: "data/prod/products/".to_string(),
        alias: "products".to_string(),
        profile: "prod".to_string(),
        file_name,
        data_time: data_time.to_string(),
        action,
        real_index: real_index_name("products", action, data_time),
        field_delimiter: ",".to_string(),
        array_delimiter: Some("|".to_string()),
        mapping: IndexMapping::new(json!({
            "mappings": {
                "properties": {
                    "id": { "type": "keyword" },
                    "name": { "type": "text" },
                    "tags": { "type": "keyword" }
                }
            }
        })),
        analysis: None,
        notification: NotificationSettings::default(),
    }
}

/// Object store backed by a map.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: std::sync::Mutex<HashMap<(String, String), Vec<u8>>>,
    fail_copy: bool,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_copy(mut self) -> Self {
        self.fail_copy = true;
        self
    }

    pub fn put(&self, bucket: &str, key: &str, contents: impl Into<String>) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), contents.into().into_bytes());
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.objects
            .lock()
            .unwrap()
            .contains_key(&(bucket.to_string(), key.to_string()))
    }

    fn read(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::not_found(bucket, key))
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<ObjectReader, StorageError> {
        Ok(Box::new(Cursor::new(self.read(bucket, key)?)))
    }

    async fn copy(&self, bucket: &str, src_key: &str, dst_key: &str) -> Result<(), StorageError> {
        if self.fail_copy {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("cannot write {}", dst_key),
            )));
        }
        let contents = self.read(bucket, src_key)?;
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), dst_key.to_string()), contents);
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.objects
            .lock()
            .unwrap()
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}

/// Search client that records every call.
#[derive(Default)]
pub struct MockSearchClient {
    alias_binding: Vec<String>,
    indices: Vec<String>,
    fail_create: bool,
    fail_bulk_after: Option<usize>,
    fail_alias_lookup: bool,
    fail_alias_update: bool,
    fail_list: bool,
    fail_delete: bool,
    bulk_calls: AtomicUsize,
    created: Mutex<Vec<(String, IndexDefinition)>>,
    bulk_bodies: Mutex<Vec<String>>,
    alias_updates: Mutex<Vec<Vec<AliasAction>>>,
    list_patterns: Mutex<Vec<String>>,
    deleted: Mutex<Vec<Vec<String>>>,
}

impl MockSearchClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indices the alias resolves to before the run.
    pub fn with_alias_binding(mut self, indices: Vec<String>) -> Self {
        self.alias_binding = indices;
        self
    }

    /// Indices returned by any pattern listing.
    pub fn with_indices(mut self, indices: Vec<String>) -> Self {
        self.indices = indices;
        self
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn failing_alias_lookup(mut self) -> Self {
        self.fail_alias_lookup = true;
        self
    }

    pub fn failing_alias_update(mut self) -> Self {
        self.fail_alias_update = true;
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    /// Accept `n` bulk requests, then fail every following one.
    pub fn failing_bulk_after(mut self, n: usize) -> Self {
        self.fail_bulk_after = Some(n);
        self
    }

    pub async fn created_indices(&self) -> Vec<(String, IndexDefinition)> {
        self.created.lock().await.clone()
    }

    /// Bodies of accepted bulk requests.
    pub async fn bulk_bodies(&self) -> Vec<String> {
        self.bulk_bodies.lock().await.clone()
    }

    pub async fn alias_updates(&self) -> Vec<Vec<AliasAction>> {
        self.alias_updates.lock().await.clone()
    }

    pub async fn list_patterns(&self) -> Vec<String> {
        self.list_patterns.lock().await.clone()
    }

    pub async fn deleted_indices(&self) -> Vec<Vec<String>> {
        self.deleted.lock().await.clone()
    }
}

#[async_trait]
impl SearchEngineClient for MockSearchClient {
    async fn create_index(
        &self,
        name: &str,
        definition: &IndexDefinition,
    ) -> Result<(), SearchError> {
        if self.fail_create {
            return Err(SearchError::index_creation(format!("{} already exists", name)));
        }
        self.created
            .lock()
            .await
            .push((name.to_string(), definition.clone()));
        Ok(())
    }

    async fn bulk(&self, body: &str) -> Result<(), SearchError> {
        let call = self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        if matches!(self.fail_bulk_after, Some(n) if call >= n) {
            return Err(SearchError::bulk_index("mapper_parsing_exception"));
        }
        self.bulk_bodies.lock().await.push(body.to_string());
        Ok(())
    }

    async fn get_alias_binding(&self, alias: &str) -> Result<Vec<String>, SearchError> {
        if self.fail_alias_lookup {
            return Err(SearchError::alias(format!("cannot read alias {}", alias)));
        }
        Ok(self.alias_binding.clone())
    }

    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<(), SearchError> {
        if self.fail_alias_update {
            return Err(SearchError::alias("index_not_found_exception"));
        }
        self.alias_updates.lock().await.push(actions.to_vec());
        Ok(())
    }

    async fn list_indices_matching(&self, pattern: &str) -> Result<Vec<String>, SearchError> {
        if self.fail_list {
            return Err(SearchError::cat(format!("cannot list {}", pattern)));
        }
        self.list_patterns.lock().await.push(pattern.to_string());
        Ok(self.indices.clone())
    }

    async fn delete_indices(&self, names: &[String]) -> Result<(), SearchError> {
        if self.fail_delete {
            return Err(SearchError::delete(format!("cannot delete {:?}", names)));
        }
        self.deleted.lock().await.push(names.to_vec());
        Ok(())
    }
}

/// Sink that keeps every event.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(NotificationStep, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<(NotificationStep, String)> {
        self.events.lock().await.clone()
    }

    pub async fn steps(&self) -> Vec<NotificationStep> {
        self.events
            .lock()
            .await
            .iter()
            .map(|(step, _)| *step)
            .collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
    async fn send(&self, step: NotificationStep, message: &str) {
        self.events.lock().await.push((step, message.to_string()));
    }
}
