//! MinIO/S3-compatible blob client
//!
//! Uses rust-s3 for lightweight S3 operations; path-style URLs so it works
//! against a bare MinIO endpoint.

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};

use crate::core::config::BlobConfig;
use crate::core::error::{AppError, Result};

use super::BlobStore;

pub struct MinioBlobClient {
    bucket: Box<Bucket>,
}

impl MinioBlobClient {
    /// Create a client from configuration, creating the bucket if it does
    /// not exist yet.
    pub async fn new(config: &BlobConfig) -> Result<Self> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create blob credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to open blob bucket: {}", e)))?;

        // Path-style URLs for MinIO (http://endpoint/bucket, not http://bucket.endpoint)
        bucket.set_path_style();

        let client = Self { bucket };
        client.ensure_bucket_exists(region, credentials).await?;

        info!(
            "Blob client initialized for endpoint: {}, bucket: {}",
            config.endpoint,
            client.bucket.name()
        );

        Ok(client)
    }

    async fn ensure_bucket_exists(&self, region: Region, credentials: Credentials) -> Result<()> {
        match Bucket::create_with_path_style(
            &self.bucket.name(),
            region,
            credentials,
            BucketConfiguration::default(),
        )
        .await
        {
            Ok(_) => {
                info!("Bucket '{}' created", self.bucket.name());
                Ok(())
            }
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                    Ok(())
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                    Ok(())
                }
            }
        }
    }
}

#[async_trait]
impl BlobStore for MinioBlobClient {
    async fn put_blob(&self, path: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        self.bucket
            .put_object_with_content_type(path, &data, content_type)
            .await
            .map_err(|e| {
                AppError::StoreUnavailable(format!("Failed to upload blob '{}': {}", path, e))
            })?;

        debug!("Uploaded blob '{}' to bucket '{}'", path, self.bucket.name());
        Ok(())
    }

    async fn get_blob(&self, path: &str) -> Result<Vec<u8>> {
        let response = self.bucket.get_object(path).await.map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to download blob '{}': {}", path, e))
        })?;

        Ok(response.to_vec())
    }

    async fn delete_blob(&self, path: &str) -> Result<()> {
        self.bucket.delete_object(path).await.map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to delete blob '{}': {}", path, e))
        })?;

        debug!(
            "Deleted blob '{}' from bucket '{}'",
            path,
            self.bucket.name()
        );
        Ok(())
    }

    async fn signed_url(&self, path: &str, ttl_secs: u32) -> Result<String> {
        self.bucket.presign_get(path, ttl_secs, None).await.map_err(|e| {
            AppError::StoreUnavailable(format!(
                "Failed to generate signed URL for '{}': {}",
                path, e
            ))
        })
    }
}
