//! Object store trait definition.

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::errors::StorageError;

/// Byte stream over an object's contents.
pub type ObjectReader = Box<dyn AsyncRead + Send + Unpin>;

/// Blob storage holding data files and their configuration documents.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Open `bucket/key` for streaming.
    async fn get(&self, bucket: &str, key: &str) -> Result<ObjectReader, StorageError>;

    /// Copy `src_key` to `dst_key` within `bucket`, overwriting any existing object.
    async fn copy(&self, bucket: &str, src_key: &str, dst_key: &str) -> Result<(), StorageError>;

    /// Delete `bucket/key`.
    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError>;
}
