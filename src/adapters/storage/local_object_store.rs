//! Local filesystem implementation of the ObjectStore port.
//!
//! Stores generated images under a base directory using a
//! write-to-temp-then-rename pattern, so a crash mid-write never leaves a
//! half-written image behind the returned reference.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::foundation::DomainError;
use crate::ports::ObjectStore;

/// Local filesystem object store.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    /// Base directory for all stored objects.
    base_path: PathBuf,
}

impl LocalObjectStore {
    /// Creates a new store rooted at `base_path`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, DomainError> {
        let path = self.object_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                DomainError::storage(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            DomainError::storage(format!("Failed to create {}: {}", temp_path.display(), e))
        })?;
        file.write_all(&bytes).await.map_err(|e| {
            DomainError::storage(format!("Failed to write {}: {}", temp_path.display(), e))
        })?;
        file.sync_all().await.map_err(|e| {
            DomainError::storage(format!("Failed to sync {}: {}", temp_path.display(), e))
        })?;
        fs::rename(&temp_path, &path).await.map_err(|e| {
            DomainError::storage(format!("Failed to rename to {}: {}", path.display(), e))
        })?;

        Ok(path.display().to_string())
    }
}
