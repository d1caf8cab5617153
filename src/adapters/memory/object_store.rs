//! In-memory implementation of ObjectStore.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::DomainError;
use crate::ports::ObjectStore;

/// In-memory object store returning `mem://` references.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieves stored bytes by reference, for test assertions.
    pub async fn get(&self, object_ref: &str) -> Option<Vec<u8>> {
        let objects = self.objects.read().await;
        objects.get(object_ref).cloned()
    }

    /// Number of stored objects, for test assertions.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, DomainError> {
        let object_ref = format!("mem://{}", key);
        let mut objects = self.objects.write().await;
        objects.insert(object_ref.clone(), bytes);
        Ok(object_ref)
    }
}
