use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub trash: TrashConfig,
    pub sweep: SweepConfig,
    pub link_cache: LinkCacheConfig,
    pub blob: BlobConfig,
}

/// Trash retention settings for soft-deleted files and folders
#[derive(Debug, Clone)]
pub struct TrashConfig {
    /// Days a soft-deleted item stays recoverable before the purge sweep
    /// may permanently delete it
    pub retention_days: i64,
}

/// Background purge sweep scheduling
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub interval_secs: u64,
}

/// In-process cache for shareable-link listings
#[derive(Debug, Clone)]
pub struct LinkCacheConfig {
    pub ttl_secs: u64,
    pub max_entries: u64,
}

/// MinIO/S3 storage configuration for file content blobs
#[derive(Debug, Clone)]
pub struct BlobConfig {
    /// MinIO/S3 endpoint URL
    pub endpoint: String,
    /// Access key for authentication
    pub access_key: String,
    /// Secret key for authentication
    pub secret_key: String,
    /// Bucket name for storing file content
    pub bucket: String,
    /// AWS region (for S3 compatibility)
    pub region: String,
    /// Signed URL expiry time in seconds
    pub signed_url_expiry_secs: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            trash: TrashConfig::from_env()?,
            sweep: SweepConfig::from_env()?,
            link_cache: LinkCacheConfig::from_env()?,
            blob: BlobConfig::from_env()?,
        })
    }
}

impl TrashConfig {
    const DEFAULT_RETENTION_DAYS: i64 = 60;

    pub fn from_env() -> Result<Self, String> {
        let retention_days = env::var("TRASH_RETENTION_DAYS")
            .unwrap_or_else(|_| Self::DEFAULT_RETENTION_DAYS.to_string())
            .parse::<i64>()
            .map_err(|_| "TRASH_RETENTION_DAYS must be a valid number".to_string())?;

        if retention_days <= 0 {
            return Err("TRASH_RETENTION_DAYS must be positive".to_string());
        }

        Ok(Self { retention_days })
    }
}

impl SweepConfig {
    const DEFAULT_INTERVAL_SECS: u64 = 86_400; // daily

    pub fn from_env() -> Result<Self, String> {
        let interval_secs = env::var("PURGE_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_INTERVAL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "PURGE_SWEEP_INTERVAL_SECS must be a valid number".to_string())?;

        Ok(Self { interval_secs })
    }
}

impl LinkCacheConfig {
    const DEFAULT_TTL_SECS: u64 = 300; // 5 minutes
    const DEFAULT_MAX_ENTRIES: u64 = 10_000;

    pub fn from_env() -> Result<Self, String> {
        let ttl_secs = env::var("LINK_CACHE_TTL_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_TTL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "LINK_CACHE_TTL_SECS must be a valid number".to_string())?;

        let max_entries = env::var("LINK_CACHE_MAX_ENTRIES")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_ENTRIES.to_string())
            .parse::<u64>()
            .map_err(|_| "LINK_CACHE_MAX_ENTRIES must be a valid number".to_string())?;

        Ok(Self {
            ttl_secs,
            max_entries,
        })
    }
}

impl BlobConfig {
    const DEFAULT_SIGNED_URL_EXPIRY_SECS: u32 = 3600; // 1 hour

    pub fn from_env() -> Result<Self, String> {
        let endpoint =
            env::var("BLOB_ENDPOINT").unwrap_or_else(|_| "http://localhost:9000".to_string());

        let access_key = env::var("BLOB_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string());

        let secret_key = env::var("BLOB_SECRET_KEY").unwrap_or_else(|_| "minioadmin".to_string());

        let bucket = env::var("BLOB_BUCKET").unwrap_or_else(|_| "taskfolio-files".to_string());

        let region = env::var("BLOB_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        let signed_url_expiry_secs = env::var("BLOB_SIGNED_URL_EXPIRY_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_SIGNED_URL_EXPIRY_SECS.to_string())
            .parse::<u32>()
            .map_err(|_| "BLOB_SIGNED_URL_EXPIRY_SECS must be a valid number".to_string())?;

        Ok(Self {
            endpoint,
            access_key,
            secret_key,
            bucket,
            region,
            signed_url_expiry_secs,
        })
    }
}
