//! ObjectStore port - binary storage for generated images.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;

/// Port for persisting generated images.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `bytes` under a location derived from `key`.
    ///
    /// Returns a stable reference (URL or path) to the stored object.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, DomainError>;
}
