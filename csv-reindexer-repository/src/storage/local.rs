//! Filesystem-backed object store.
//!
//! Buckets are directories under a root; keys are relative paths inside them.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::BufReader;
use tracing::debug;

use crate::errors::StorageError;
use crate::interfaces::{ObjectReader, ObjectStore};

/// Object store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map `bucket/key` onto a path under the root, refusing keys that would
    /// escape it.
    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(bucket).join(key);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::invalid_key(format!("{}/{}", bucket, key)));
        }
        Ok(self.root.join(relative))
    }
}

fn map_not_found(err: std::io::Error, bucket: &str, key: &str) -> StorageError {
    if err.kind() == std::io::ErrorKind::NotFound {
        StorageError::not_found(bucket, key)
    } else {
        StorageError::Io(err)
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<ObjectReader, StorageError> {
        let path = self.object_path(bucket, key)?;
        let file = fs::File::open(&path)
            .await
            .map_err(|e| map_not_found(e, bucket, key))?;

        debug!(path = %path.display(), "Opened object");
        Ok(Box::new(BufReader::new(file)))
    }

    async fn copy(&self, bucket: &str, src_key: &str, dst_key: &str) -> Result<(), StorageError> {
        let src = self.object_path(bucket, src_key)?;
        let dst = self.object_path(bucket, dst_key)?;

        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::copy(&src, &dst)
            .await
            .map_err(|e| map_not_found(e, bucket, src_key))?;

        debug!(src = %src.display(), dst = %dst.display(), "Copied object");
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let path = self.object_path(bucket, key)?;
        fs::remove_file(&path)
            .await
            .map_err(|e| map_not_found(e, bucket, key))?;
        Ok(())
    }
}
