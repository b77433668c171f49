//! Error types for the reindexing pipeline.

use csv_reindexer_repository::{SearchError, StorageError};
use thiserror::Error;

/// Errors that can end a reindexing run.
///
/// Every variant is fatal to the run; nothing is retried.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Bad object key, unknown action, or missing/invalid config document.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Filename does not follow `<timestamp>.<action>.<ext>`.
    #[error("Invalid filename '{file_name}': {reason}")]
    InvalidFilenameError { file_name: String, reason: String },

    /// Header names a field the index mapping does not define, or there is no header.
    #[error("Schema validation error: {0}")]
    SchemaValidationError(String),

    /// A data row has a different number of fields than the header.
    #[error("Field count mismatch at line {line}: header has {expected} fields, row has {actual}")]
    FieldCountMismatchError {
        line: usize,
        expected: usize,
        actual: usize,
    },

    /// Creating the new physical index failed.
    #[error("Index provisioning error for {index}: {source}")]
    IndexProvisioningError {
        index: String,
        #[source]
        source: SearchError,
    },

    /// A bulk request failed; earlier batches stay loaded.
    #[error("Bulk load error for {index}: {source}")]
    BulkLoadError {
        index: String,
        #[source]
        source: SearchError,
    },

    /// Alias lookup or repoint failed.
    #[error("Alias update error for {alias}: {source}")]
    AliasUpdateError {
        alias: String,
        #[source]
        source: SearchError,
    },

    /// The alias resolves to more than one index; needs manual repair.
    #[error("Alias {alias} is bound to multiple indices: {}", .indices.join(", "))]
    MultipleAliasBindingError { alias: String, indices: Vec<String> },

    /// Listing or deleting superseded indices failed.
    #[error("Cleanup error for {alias}: {source}")]
    CleanupError {
        alias: String,
        #[source]
        source: SearchError,
    },

    /// Moving the consumed source file to its backup location failed.
    #[error("Archive error for {key}: {source}")]
    ArchiveError {
        key: String,
        #[source]
        source: StorageError,
    },

    /// Reading the source file failed.
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    /// The source stream could not be read as UTF-8 lines.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// A bulk line could not be rendered.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl IngestError {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }

    /// Create an invalid filename error.
    pub fn invalid_filename(file_name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidFilenameError {
            file_name: file_name.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a schema validation error.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::SchemaValidationError(msg.into())
    }

    /// Create a field count mismatch error.
    pub fn field_count_mismatch(line: usize, expected: usize, actual: usize) -> Self {
        Self::FieldCountMismatchError {
            line,
            expected,
            actual,
        }
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
