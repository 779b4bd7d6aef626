//! Content-blob storage
//!
//! Backend for the raw bytes of uploaded files. Lifecycle services only see
//! the [`BlobStore`] trait; the MinIO/S3 client is the production
//! implementation and the in-memory store backs tests and the local harness.

mod memory;
mod minio_client;

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::error::Result;

pub use memory::MemoryBlobStore;
pub use minio_client::MinioBlobClient;

/// Opaque-path blob backend consumed by the lifecycle engine.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store content under the given path, overwriting any existing blob.
    async fn put_blob(&self, path: &str, data: Vec<u8>, content_type: &str) -> Result<()>;

    /// Fetch the content stored under the path.
    async fn get_blob(&self, path: &str) -> Result<Vec<u8>>;

    /// Remove the blob. Deleting an absent path is not an error.
    async fn delete_blob(&self, path: &str) -> Result<()>;

    /// Time-limited URL granting direct read access to the blob.
    async fn signed_url(&self, path: &str, ttl_secs: u32) -> Result<String>;
}

pub type BlobStoreRef = Arc<dyn BlobStore>;
