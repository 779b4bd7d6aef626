use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskfolio_files::core::config::Config;
use taskfolio_files::features::files::TrashService;
use taskfolio_files::modules::storage::{BlobStoreRef, MinioBlobClient};
use taskfolio_files::modules::store::{DocumentStoreRef, MemoryStore};

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!("Configuration loaded successfully");

    // Explicit dependency injection: adapters are built once here and handed
    // to the services. Deployments with a concrete partitioned document
    // store swap the in-memory adapter for their own implementation.
    let store: DocumentStoreRef = Arc::new(MemoryStore::with_engine_indexes());
    let blob: BlobStoreRef = Arc::new(MinioBlobClient::new(&config.blob).await?);

    let trash = TrashService::new(store, blob, config.trash.retention_days);

    tracing::info!(
        "Purge sweep worker started (interval: {}s, retention: {} days)",
        config.sweep.interval_secs,
        config.trash.retention_days
    );

    // No overlap guard: the sweep itself is idempotent, so a slow run racing
    // the next tick is harmless.
    let mut ticker =
        tokio::time::interval(std::time::Duration::from_secs(config.sweep.interval_secs));
    loop {
        ticker.tick().await;
        match trash.run_purge_sweep().await {
            Ok(report) => {
                tracing::debug!(
                    "Sweep finished: {} file(s), {} folder(s) purged",
                    report.purged_files,
                    report.purged_folders
                );
            }
            Err(e) => {
                tracing::error!("Purge sweep run failed: {}", e);
            }
        }
    }
}
