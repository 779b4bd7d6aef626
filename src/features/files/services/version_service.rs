use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::files::dtos::UploadNewVersionRequest;
use crate::features::files::models::{
    file::{lineage_key, lineage_slug},
    FileRecord, FileScope, LifecycleStatus, LineageHead, VersionStatus, REC_FILE, REC_LINEAGE,
};
use crate::modules::storage::BlobStoreRef;
use crate::modules::store::{
    self, DocumentStoreRef, Expected, RecordKey, IDX_BY_LINEAGE,
};

/// Attempts to reserve a version number before giving up on a contended
/// lineage.
const MAX_ASSIGN_ATTEMPTS: usize = 3;

/// Result of an upload. The new record is `current` immediately; demotion of
/// the previous versions to `superseded` runs in the background task behind
/// `supersede` and is only eventually visible.
#[derive(Debug)]
pub struct UploadOutcome {
    pub file: FileRecord,
    /// Handle of the spawned demotion task (number of records demoted).
    /// `None` when there was no previous active version.
    pub supersede: Option<JoinHandle<usize>>,
}

/// Version Manager: owns the rule that uploads sharing an original filename
/// within one (project, task, folder) scope form a single version lineage.
pub struct VersionService {
    store: DocumentStoreRef,
    blob: BlobStoreRef,
}

impl VersionService {
    pub fn new(store: DocumentStoreRef, blob: BlobStoreRef) -> Self {
        Self { store, blob }
    }

    /// The lineage key addressing one container, for callers that want to
    /// list versions later.
    pub fn lineage_key(scope: &FileScope, original_filename: &str) -> String {
        lineage_key(scope, original_filename)
    }

    /// Upload a new version of a file container.
    ///
    /// Uploads sharing an original filename within one scope stack into a
    /// lineage: an empty active set starts a fresh container at "1.0"
    /// (regardless of deleted history), otherwise the new record becomes
    /// version `count + 1` and every previous active version is demoted to
    /// `superseded` in the background.
    pub async fn upload_new_version(&self, request: UploadNewVersionRequest) -> Result<UploadOutcome> {
        let original_filename = request.original_filename.trim().to_string();
        if original_filename.is_empty() {
            return Err(AppError::InvalidArgument(
                "Original filename must not be empty".to_string(),
            ));
        }
        if request.uploaded_by.is_empty() {
            return Err(AppError::InvalidArgument(
                "Uploader identity must not be empty".to_string(),
            ));
        }

        let file_id = Uuid::new_v4();
        let extension = original_filename.rsplit('.').next().unwrap_or("bin");
        let storage_path = format!("uploads/{}/{}.{}", request.uploaded_by, file_id, extension);
        let file_size = request.data.len() as i64;

        // Content first; a record pointing at a missing blob is worse than an
        // orphaned blob.
        self.blob
            .put_blob(&storage_path, request.data, &request.content_type)
            .await?;
        debug!("Blob stored at '{}'", storage_path);

        let (version_number, generation, previous_active) = self
            .reserve_version(&request.scope, &original_filename)
            .await?;

        let now = Utc::now();
        let file = FileRecord {
            id: file_id,
            display_name: request
                .display_name
                .unwrap_or_else(|| original_filename.clone()),
            original_filename: original_filename.clone(),
            file_size,
            content_type: request.content_type,
            storage_path,
            scope: request.scope.clone(),
            lineage_key: lineage_key(&request.scope, &original_filename),
            version_number,
            version_label: FileRecord::version_label(version_number),
            version_status: VersionStatus::Current,
            lineage_generation: generation,
            workflow_state: request.workflow_state,
            lifecycle_status: LifecycleStatus::Active,
            deleted_at: None,
            deleted_by: None,
            scheduled_purge_at: None,
            parent_folder_id: request.scope.folder_id,
            uploaded_by: request.uploaded_by,
            created_at: now,
            updated_at: now,
        };

        self.store
            .put(&file.record_key(), store::to_document(REC_FILE, &file)?)
            .await?;

        info!(
            "Uploaded version {} of '{}' (lineage {}, generation {})",
            file.version_label, file.original_filename, file.lineage_key, generation
        );

        // Best-effort background fix-up: demote the previous active set. Its
        // failure must not fail the upload.
        let supersede = if previous_active.is_empty() {
            None
        } else {
            Some(Self::spawn_supersede(
                Arc::clone(&self.store),
                previous_active,
            ))
        };

        Ok(UploadOutcome { file, supersede })
    }

    /// Decide the version number and generation for a new upload and reserve
    /// them through a conditional write on the lineage head, so two racing
    /// uploads cannot both claim the same number.
    async fn reserve_version(
        &self,
        scope: &FileScope,
        original_filename: &str,
    ) -> Result<(u32, u32, Vec<RecordKey>)> {
        let head_key = LineageHead::record_key(scope, original_filename);
        let key = lineage_key(scope, original_filename);

        for _ in 0..MAX_ASSIGN_ATTEMPTS {
            let active = self.active_members(scope, original_filename).await?;

            let head: Option<LineageHead> = match self.store.get(&head_key).await? {
                Some(doc) => Some(store::from_document(doc)?),
                None => None,
            };

            // Fresh-container rule: a lineage with zero active members starts
            // over at version 1, in a new generation.
            let (version_number, generation) = match (&head, active.is_empty()) {
                (None, _) => (active.len() as u32 + 1, 1),
                (Some(h), true) => (1, h.generation + 1),
                (Some(h), false) => (active.len() as u32 + 1, h.generation),
            };

            let new_head = LineageHead {
                lineage_key: key.clone(),
                generation,
                last_version: version_number,
                revision: head.as_ref().map(|h| h.revision + 1).unwrap_or(1),
            };
            let expected = match &head {
                None => Expected::Absent,
                Some(h) => Expected::FieldEquals(
                    "revision".to_string(),
                    serde_json::Value::from(h.revision),
                ),
            };

            let applied = self
                .store
                .put_if(
                    &head_key,
                    store::to_document(REC_LINEAGE, &new_head)?,
                    expected,
                )
                .await?;
            if applied {
                let previous = active.iter().map(FileRecord::record_key).collect();
                return Ok((version_number, generation, previous));
            }

            debug!("Version reservation lost a race on lineage {}, retrying", key);
        }

        Err(AppError::Conflict(format!(
            "Concurrent uploads contending on container '{}'",
            key
        )))
    }

    async fn active_members(
        &self,
        scope: &FileScope,
        original_filename: &str,
    ) -> Result<Vec<FileRecord>> {
        let docs = self
            .store
            .query_partition(
                &scope.partition_key(),
                &format!("file#{}#", lineage_slug(original_filename)),
            )
            .await?;

        let mut members = Vec::with_capacity(docs.len());
        for doc in docs {
            let record: FileRecord = store::from_document(doc)?;
            if record.is_active() {
                members.push(record);
            }
        }
        Ok(members)
    }

    fn spawn_supersede(store: DocumentStoreRef, keys: Vec<RecordKey>) -> JoinHandle<usize> {
        tokio::spawn(async move {
            let mut demoted = 0;
            for key in keys {
                match Self::demote(&store, &key).await {
                    Ok(true) => demoted += 1,
                    Ok(false) => {}
                    Err(e) => {
                        // Logged and continued: the supersede step is
                        // explicitly best-effort relative to the upload.
                        warn!("Failed to demote previous version {:?}: {}", key, e);
                    }
                }
            }
            debug!("Demoted {} previous version(s) to superseded", demoted);
            demoted
        })
    }

    async fn demote(store: &DocumentStoreRef, key: &RecordKey) -> Result<bool> {
        let Some(doc) = store.get(key).await? else {
            return Ok(false);
        };
        let mut record: FileRecord = store::from_document(doc)?;
        if record.version_status == VersionStatus::Superseded || !record.is_active() {
            return Ok(false);
        }
        record.version_status = VersionStatus::Superseded;
        record.updated_at = Utc::now();
        store
            .put(key, store::to_document(REC_FILE, &record)?)
            .await?;
        Ok(true)
    }

    /// List the members of a lineage, newest first (numeric compare on the
    /// version number, not lexicographic). Soft-deleted versions only appear
    /// when `include_deleted` is set; purged versions never do.
    pub async fn list_versions(
        &self,
        lineage_key: &str,
        include_deleted: bool,
    ) -> Result<Vec<FileRecord>> {
        let docs = self.store.query_index(IDX_BY_LINEAGE, lineage_key).await?;

        let mut versions = Vec::new();
        for doc in docs {
            // The lineage head shares the index key; skip it.
            if store::record_type(&doc) != Some(REC_FILE) {
                continue;
            }
            let record: FileRecord = store::from_document(doc)?;
            let visible = match record.lifecycle_status {
                LifecycleStatus::Active => true,
                LifecycleStatus::Deleted => include_deleted,
                LifecycleStatus::PermanentlyDeleted => false,
            };
            if visible {
                versions.push(record);
            }
        }

        versions.sort_by(|a, b| {
            b.version_number
                .cmp(&a.version_number)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(versions)
    }

    /// Signed download URL for one version's content.
    pub async fn download_url(&self, file_id: Uuid, ttl_secs: u32) -> Result<String> {
        let file = super::find_file(self.store.as_ref(), file_id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;
        if !file.is_active() {
            return Err(AppError::PreconditionFailed(
                "File is in the trash".to_string(),
            ));
        }
        self.blob.signed_url(&file.storage_path, ttl_secs).await
    }
}
