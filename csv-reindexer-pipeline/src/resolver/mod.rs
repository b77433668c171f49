//! Request resolution.
//!
//! Turns a triggering event (bucket + object key) and the companion
//! `config.json` into an immutable [`IngestionRequest`].

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::IngestError;
use csv_reindexer_repository::{ObjectStore, StorageError};
use csv_reindexer_shared::{
    real_index_name, IndexAction, IndexMapping, IngestionRequest, KeyLayout, KeySegment,
    NotificationSettings, SlackSettings,
};

/// Name of the configuration document next to each data file.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Field delimiter used when the config document does not set one.
pub const DEFAULT_FIELD_DELIMITER: &str = ",";

const DATA_TIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// The object-created event that starts a run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TriggerEvent {
    pub bucket: String,
    pub key: String,
}

impl TriggerEvent {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

/// The companion configuration document. Every key is optional at the
/// parsing level; `indexMappings` is enforced by the resolver.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    #[serde(default)]
    pub index_mappings: Option<Value>,
    #[serde(default)]
    pub index_analysis: Option<Value>,
    #[serde(default, alias = "fileFieldDelemeter")]
    pub file_field_delimiter: Option<String>,
    #[serde(default)]
    pub field_array_delimiter: Option<String>,
    #[serde(default)]
    pub slack: Option<SlackSettings>,
}

/// Key segments assigned by the layout.
#[derive(Debug, Clone, PartialEq, Eq)]
struct KeyParts {
    root: String,
    profile: String,
    alias: String,
    file_name: String,
    config_dir: String,
}

impl KeyParts {
    fn parse(key: &str, layout: &KeyLayout) -> Result<Self, IngestError> {
        let segments: Vec<&str> = key.split('/').collect();
        let expected = layout.segments().len();

        if segments.len() != expected || segments.iter().any(|s| s.is_empty()) {
            return Err(IngestError::configuration(format!(
                "object key '{}' must have exactly {} non-empty segments",
                key, expected
            )));
        }

        let segment = |name: KeySegment| segments[layout.position(name)].to_string();
        let config_dir = format!("{}/", segments[..expected - 1].join("/"));

        Ok(Self {
            root: segment(KeySegment::Root),
            profile: segment(KeySegment::Profile),
            alias: segment(KeySegment::Alias),
            file_name: segment(KeySegment::FileName),
            config_dir,
        })
    }
}

/// Split `<timestamp>.<action>.<ext>` into its timestamp and action.
pub fn parse_file_name(file_name: &str) -> Result<(String, IndexAction), IngestError> {
    let parts: Vec<&str> = file_name.split('.').collect();
    if parts.len() < 3 {
        return Err(IngestError::invalid_filename(
            file_name,
            "expected <timestamp>.<action>.<extension>",
        ));
    }

    let data_time = parts[0];
    if data_time.len() != 14 || !data_time.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IngestError::invalid_filename(
            file_name,
            "timestamp must be 14 digits (YYYYMMDDhhmmss)",
        ));
    }
    NaiveDateTime::parse_from_str(data_time, DATA_TIME_FORMAT)
        .map_err(|e| IngestError::invalid_filename(file_name, format!("bad timestamp: {}", e)))?;

    let action = parts[1]
        .parse::<IndexAction>()
        .map_err(|e| IngestError::configuration(e.to_string()))?;

    Ok((data_time.to_string(), action))
}

/// Resolves triggering events into ingestion requests.
pub struct RequestResolver {
    storage: Arc<dyn ObjectStore>,
    layout: KeyLayout,
}

impl RequestResolver {
    /// Create a resolver using the default `root/profile/alias/file` layout.
    pub fn new(storage: Arc<dyn ObjectStore>) -> Self {
        Self {
            storage,
            layout: KeyLayout::default(),
        }
    }

    pub fn with_layout(storage: Arc<dyn ObjectStore>, layout: KeyLayout) -> Self {
        Self { storage, layout }
    }

    /// Resolve an event into a fully populated request.
    ///
    /// Key and filename are validated before the config document is fetched,
    /// so a malformed event never touches storage.
    #[instrument(skip(self), fields(bucket = %event.bucket, key = %event.key))]
    pub async fn resolve(&self, event: &TriggerEvent) -> Result<IngestionRequest, IngestError> {
        let parts = KeyParts::parse(&event.key, &self.layout)?;
        let (data_time, action) = parse_file_name(&parts.file_name)?;
        let real_index = real_index_name(&parts.alias, action, &data_time);

        let config_key = format!("{}{}", parts.config_dir, CONFIG_FILE_NAME);
        let config = self.load_config(&event.bucket, &config_key).await?;

        let mapping = config.index_mappings.map(IndexMapping::new).ok_or_else(|| {
            IngestError::configuration(format!("{} has no indexMappings", config_key))
        })?;

        let field_delimiter = config
            .file_field_delimiter
            .unwrap_or_else(|| DEFAULT_FIELD_DELIMITER.to_string());
        if field_delimiter.is_empty() {
            return Err(IngestError::configuration(format!(
                "{} sets an empty fileFieldDelimiter",
                config_key
            )));
        }

        let array_delimiter = config.field_array_delimiter.filter(|d| !d.is_empty());

        let request = IngestionRequest {
            run_id: Uuid::new_v4(),
            bucket: event.bucket.clone(),
            key: event.key.clone(),
            root: parts.root,
            config_dir: parts.config_dir,
            alias: parts.alias,
            profile: parts.profile,
            file_name: parts.file_name,
            data_time,
            action,
            real_index,
            field_delimiter,
            array_delimiter,
            mapping,
            analysis: config.index_analysis,
            notification: NotificationSettings {
                slack: config.slack,
            },
        };

        info!(
            run_id = %request.run_id,
            alias = %request.alias,
            profile = %request.profile,
            action = %request.action,
            real_index = %request.real_index,
            "Resolved ingestion request"
        );

        Ok(request)
    }

    async fn load_config(&self, bucket: &str, key: &str) -> Result<ConfigDocument, IngestError> {
        let mut reader = self.storage.get(bucket, key).await.map_err(|e| match e {
            StorageError::NotFound { .. } => {
                IngestError::configuration(format!("config document {}/{} not found", bucket, key))
            }
            other => IngestError::configuration(format!("reading {}: {}", key, other)),
        })?;

        let mut contents = String::new();
        reader
            .read_to_string(&mut contents)
            .await
            .map_err(|e| IngestError::configuration(format!("reading {}: {}", key, e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| IngestError::configuration(format!("parsing {}: {}", key, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryObjectStore;
    use serde_json::json;

    const KEY: &str = "data/prod/products/20210101000000.create.csv";

    fn config() -> Value {
        json!({
            "indexMappings": {
                "mappings": { "properties": { "id": { "type": "keyword" }, "name": { "type": "text" } } }
            },
            "fileFieldDelimiter": "\t",
            "fieldArrayDelimiter": "|",
            "indexAnalysis": { "analyzer": {} },
            "slack": { "webhookUrl": "https://hooks.example.com/x", "channel": "#search" }
        })
    }

    fn resolver_with(config: Option<Value>) -> RequestResolver {
        let store = MemoryObjectStore::new();
        if let Some(config) = config {
            store.put("bucket", "data/prod/products/config.json", config.to_string());
        }
        RequestResolver::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_resolve_create() {
        let resolver = resolver_with(Some(config()));
        let request = resolver
            .resolve(&TriggerEvent::new("bucket", KEY))
            .await
            .unwrap();

        assert_eq!(request.root, "data");
        assert_eq!(request.profile, "prod");
        assert_eq!(request.alias, "products");
        assert_eq!(request.data_time, "20210101000000");
        assert_eq!(request.action, IndexAction::Create);
        assert_eq!(request.real_index, "products-20210101000000");
        assert_eq!(request.field_delimiter, "\t");
        assert_eq!(request.array_delimiter.as_deref(), Some("|"));
        assert!(request.mapping.has_property("name"));
        assert!(request.analysis.is_some());
        assert_eq!(
            request.notification.slack.unwrap().channel.as_deref(),
            Some("#search")
        );
    }

    #[tokio::test]
    async fn test_resolve_defaults_and_legacy_key() {
        let resolver = resolver_with(Some(json!({
            "indexMappings": { "mappings": { "properties": { "id": {} } } },
            "fileFieldDelemeter": ";",
            "fieldArrayDelimiter": ""
        })));
        let request = resolver
            .resolve(&TriggerEvent::new(
                "bucket",
                "data/prod/products/20210101000000.update.csv",
            ))
            .await
            .unwrap();

        assert_eq!(request.action, IndexAction::Update);
        assert_eq!(request.real_index, "products");
        assert_eq!(request.field_delimiter, ";");
        assert!(request.array_delimiter.is_none());
        assert!(request.analysis.is_none());
        assert!(request.notification.slack.is_none());
    }

    #[tokio::test]
    async fn test_resolve_alias_first_layout() {
        let store = MemoryObjectStore::new();
        store.put("bucket", "data/products/devel/config.json", config().to_string());
        let resolver = RequestResolver::with_layout(Arc::new(store), KeyLayout::alias_first());

        let request = resolver
            .resolve(&TriggerEvent::new(
                "bucket",
                "data/products/devel/20210101000000.create.csv",
            ))
            .await
            .unwrap();

        assert_eq!(request.alias, "products");
        assert_eq!(request.profile, "devel");
    }

    #[tokio::test]
    async fn test_resolve_missing_config() {
        let resolver = resolver_with(None);
        let err = resolver
            .resolve(&TriggerEvent::new("bucket", KEY))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::ConfigurationError(_)));
    }

    #[tokio::test]
    async fn test_resolve_missing_mappings() {
        let resolver = resolver_with(Some(json!({ "fileFieldDelimiter": "," })));
        let err = resolver
            .resolve(&TriggerEvent::new("bucket", KEY))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::ConfigurationError(msg) if msg.contains("indexMappings")));
    }

    #[tokio::test]
    async fn test_resolve_empty_field_delimiter() {
        let resolver = resolver_with(Some(json!({
            "indexMappings": { "properties": {} },
            "fileFieldDelimiter": ""
        })));
        assert!(matches!(
            resolver.resolve(&TriggerEvent::new("bucket", KEY)).await,
            Err(IngestError::ConfigurationError(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_bad_key() {
        let resolver = resolver_with(Some(config()));
        for key in ["products/20210101000000.create.csv", "a/b/c/d/e.create.csv", "a//c/x"] {
            assert!(matches!(
                resolver.resolve(&TriggerEvent::new("bucket", key)).await,
                Err(IngestError::ConfigurationError(_))
            ));
        }
    }

    #[test]
    fn test_parse_file_name() {
        assert_eq!(
            parse_file_name("20210101000000.create.csv").unwrap(),
            ("20210101000000".to_string(), IndexAction::Create)
        );
        assert_eq!(
            parse_file_name("20210101000000.update.tsv.gz").unwrap().1,
            IndexAction::Update
        );
    }

    #[test]
    fn test_parse_file_name_errors() {
        assert!(matches!(
            parse_file_name("20210101000000.csv"),
            Err(IngestError::InvalidFilenameError { .. })
        ));
        assert!(matches!(
            parse_file_name("2021.create.csv"),
            Err(IngestError::InvalidFilenameError { .. })
        ));
        assert!(matches!(
            parse_file_name("20211301000000.create.csv"),
            Err(IngestError::InvalidFilenameError { .. })
        ));
        assert!(matches!(
            parse_file_name("20210101000000.delete.csv"),
            Err(IngestError::ConfigurationError(_))
        ));
    }
}
