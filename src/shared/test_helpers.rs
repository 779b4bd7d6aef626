#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
use crate::core::config::LinkCacheConfig;
#[cfg(test)]
use crate::features::files::dtos::UploadNewVersionRequest;
#[cfg(test)]
use crate::features::files::models::{FileRecord, FileScope};
#[cfg(test)]
use crate::features::files::services::{LinkService, TrashService, VersionService};
#[cfg(test)]
use crate::modules::storage::{BlobStoreRef, MemoryBlobStore};
#[cfg(test)]
use crate::modules::store::{DocumentStore, DocumentStoreRef, MemoryStore};

/// Version and trash services wired over one shared in-memory store and
/// blob backend, with the production 60-day retention.
#[cfg(test)]
pub fn test_services() -> (VersionService, TrashService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::with_engine_indexes());
    let blob = Arc::new(MemoryBlobStore::new());
    let store_ref: DocumentStoreRef = store.clone();
    let blob_ref: BlobStoreRef = blob.clone();

    (
        VersionService::new(store_ref.clone(), blob_ref.clone()),
        TrashService::new(store_ref, blob_ref, 60),
        store,
    )
}

#[cfg(test)]
pub fn test_link_service() -> (LinkService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::with_engine_indexes());
    let store_ref: DocumentStoreRef = store.clone();
    let config = LinkCacheConfig {
        ttl_secs: 300,
        max_entries: 100,
    };
    (LinkService::new(store_ref, &config), store)
}

#[cfg(test)]
pub fn test_scope() -> FileScope {
    FileScope {
        project_id: Some("proj-1".to_string()),
        task_id: Some("task-1".to_string()),
        folder_id: None,
    }
}

#[cfg(test)]
pub fn test_upload(original_filename: &str, scope: FileScope) -> UploadNewVersionRequest {
    UploadNewVersionRequest {
        original_filename: original_filename.to_string(),
        display_name: None,
        content_type: "application/pdf".to_string(),
        data: b"%PDF-1.4 test content".to_vec(),
        scope,
        uploaded_by: "alice".to_string(),
        workflow_state: Some("draft-review".to_string()),
    }
}

/// Overwrite a stored file record's display name, bypassing the services.
/// Used to reproduce the historical display-name corruption.
#[cfg(test)]
pub async fn force_display_name(store: &Arc<MemoryStore>, file: &FileRecord, name: &str) {
    let key = file.record_key();
    let mut doc = store.get(&key).await.unwrap().unwrap();
    doc["display_name"] = serde_json::Value::String(name.to_string());
    store.put(&key, doc).await.unwrap();
}
