//! In-memory blob store for tests and the local harness.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::core::error::{AppError, Result};

use super::BlobStore;

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, (Vec<u8>, String)>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs (test assertions on purge behavior).
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put_blob(&self, path: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        self.blobs
            .write()
            .await
            .insert(path.to_string(), (data, content_type.to_string()));
        Ok(())
    }

    async fn get_blob(&self, path: &str) -> Result<Vec<u8>> {
        self.blobs
            .read()
            .await
            .get(path)
            .map(|(data, _)| data.clone())
            .ok_or_else(|| AppError::NotFound(format!("Blob '{}' not found", path)))
    }

    async fn delete_blob(&self, path: &str) -> Result<()> {
        self.blobs.write().await.remove(path);
        Ok(())
    }

    async fn signed_url(&self, path: &str, ttl_secs: u32) -> Result<String> {
        Ok(format!("memory://{}?ttl={}", path, ttl_secs))
    }
}
