use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::files::dtos::{PurgeReport, TrashListing};
use crate::features::files::models::{
    FileRecord, Folder, LifecycleStatus, VersionStatus, REC_FILE, REC_FOLDER,
};
use crate::modules::storage::BlobStoreRef;
use crate::modules::store::{
    self, Document, DocumentStoreRef, ScanFilter, IDX_BY_FILE_PARENT, IDX_BY_FOLDER_PARENT,
    IDX_BY_LINEAGE,
};

/// Trash / Recovery Manager: soft-deletes whole version lineages and folder
/// subtrees into a recoverable trash, restores them, and runs the periodic
/// sweep that turns expired soft-deletes into permanent deletes.
pub struct TrashService {
    store: DocumentStoreRef,
    blob: BlobStoreRef,
    retention_days: i64,
}

impl TrashService {
    pub fn new(store: DocumentStoreRef, blob: BlobStoreRef, retention_days: i64) -> Self {
        Self {
            store,
            blob,
            retention_days,
        }
    }

    /// Create a folder. The parent, when given, must exist and be active.
    pub async fn create_folder(
        &self,
        name: &str,
        parent_id: Option<Uuid>,
        created_by: &str,
    ) -> Result<Folder> {
        if name.trim().is_empty() {
            return Err(AppError::InvalidArgument(
                "Folder name must not be empty".to_string(),
            ));
        }
        if let Some(parent) = parent_id {
            let parent_folder = super::find_folder(self.store.as_ref(), parent)
                .await?
                .ok_or_else(|| AppError::NotFound("Parent folder not found".to_string()))?;
            if !parent_folder.is_active() {
                return Err(AppError::PreconditionFailed(
                    "Parent folder is in the trash".to_string(),
                ));
            }
        }

        let folder = Folder::new(name.trim().to_string(), parent_id, created_by.to_string());
        self.store
            .put(
                &folder.record_key(),
                store::to_document(REC_FOLDER, &folder)?,
            )
            .await?;
        Ok(folder)
    }

    pub async fn get_folder(&self, folder_id: Uuid) -> Result<Folder> {
        super::find_folder(self.store.as_ref(), folder_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Folder not found".to_string()))
    }

    /// Soft-delete a file container.
    ///
    /// The caller names any one version; the whole lineage goes to the trash
    /// as one unit. Every active member is stamped `deleted` with one shared
    /// deadline, so no stale version can resurface after a later restore.
    /// Returns the number of versions affected.
    pub async fn soft_delete_file_container(
        &self,
        file_id: Uuid,
        deleted_by: &str,
    ) -> Result<usize> {
        let file = super::find_file(self.store.as_ref(), file_id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;
        if !file.is_active() {
            return Err(AppError::PreconditionFailed(
                "File is already in the trash".to_string(),
            ));
        }

        let members = self.active_lineage_members(&file.lineage_key).await?;
        let now = Utc::now();
        let deadline = now + Duration::days(self.retention_days);

        let total = members.len();
        let mut applied = 0;
        for mut member in members {
            self.stamp_file_deleted(&mut member, deleted_by, now, deadline)
                .await
                .map_err(|e| {
                    error!(
                        "Container delete of lineage {} stopped after {} of {}: {}",
                        file.lineage_key, applied, total, e
                    );
                    AppError::PartialFailure(
                        "Container soft-delete partially applied; retry is safe".to_string(),
                        applied,
                        total,
                    )
                })?;
            applied += 1;
        }

        info!(
            "Soft-deleted {} version(s) of lineage {} (purge at {})",
            applied, file.lineage_key, deadline
        );
        Ok(applied)
    }

    /// Soft-delete a folder and everything below it.
    ///
    /// The full descendant set (subfolders at any depth and their files) is
    /// collected first, then stamped as one logical batch with one shared
    /// deadline. The operation is idempotent: already-deleted descendants
    /// are left untouched, so a partially applied delete can be retried.
    pub async fn soft_delete_folder(&self, folder_id: Uuid, deleted_by: &str) -> Result<usize> {
        let folder = self.get_folder(folder_id).await?;
        if !folder.is_active() {
            return Err(AppError::PreconditionFailed(
                "Folder is already in the trash".to_string(),
            ));
        }

        let (folders, files) = self.collect_subtree(folder).await?;
        let now = Utc::now();
        let deadline = now + Duration::days(self.retention_days);

        let total = folders.len() + files.len();
        let mut applied = 0;
        for mut sub in folders {
            sub.lifecycle_status = LifecycleStatus::Deleted;
            sub.deleted_at = Some(now);
            sub.deleted_by = Some(deleted_by.to_string());
            sub.scheduled_purge_at = Some(deadline);
            sub.updated_at = now;
            self.store
                .put(&sub.record_key(), store::to_document(REC_FOLDER, &sub)?)
                .await
                .map_err(|e| {
                    error!(
                        "Folder delete of {} stopped after {} of {}: {}",
                        folder_id, applied, total, e
                    );
                    AppError::PartialFailure(
                        "Folder soft-delete partially applied; retry is safe".to_string(),
                        applied,
                        total,
                    )
                })?;
            applied += 1;
        }
        for mut file in files {
            self.stamp_file_deleted(&mut file, deleted_by, now, deadline)
                .await
                .map_err(|e| {
                    error!(
                        "Folder delete of {} stopped after {} of {}: {}",
                        folder_id, applied, total, e
                    );
                    AppError::PartialFailure(
                        "Folder soft-delete partially applied; retry is safe".to_string(),
                        applied,
                        total,
                    )
                })?;
            applied += 1;
        }

        info!(
            "Soft-deleted folder {} with {} item(s) (purge at {})",
            folder_id, applied, deadline
        );
        Ok(applied)
    }

    /// Restore a soft-deleted file container.
    ///
    /// Restores every trashed member of the lineage (the mirror image of the
    /// container-wide delete). Returns the number of versions restored.
    pub async fn restore_file(&self, file_id: Uuid) -> Result<usize> {
        let file = super::find_file(self.store.as_ref(), file_id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;
        self.require_restorable(file.lifecycle_status)?;

        let docs = self
            .store
            .query_index(IDX_BY_LINEAGE, &file.lineage_key)
            .await?;
        let mut restored = 0;
        for doc in docs {
            if store::record_type(&doc) != Some(REC_FILE) {
                continue;
            }
            let mut member: FileRecord = store::from_document(doc)?;
            if member.lifecycle_status != LifecycleStatus::Deleted {
                continue;
            }
            self.restore_file_record(&mut member).await?;
            restored += 1;
        }
        self.reconcile_lineage(&file.lineage_key).await?;

        info!(
            "Restored {} version(s) of lineage {}",
            restored, file.lineage_key
        );
        Ok(restored)
    }

    /// Restore a soft-deleted folder and every trashed descendant.
    pub async fn restore_folder(&self, folder_id: Uuid) -> Result<usize> {
        let folder = self.get_folder(folder_id).await?;
        self.require_restorable(folder.lifecycle_status)?;

        let (folders, files) = self.collect_deleted_subtree(folder).await?;
        let now = Utc::now();

        let mut restored = 0;
        for mut sub in folders {
            sub.lifecycle_status = LifecycleStatus::Active;
            sub.deleted_at = None;
            sub.deleted_by = None;
            sub.scheduled_purge_at = None;
            sub.updated_at = now;
            self.store
                .put(&sub.record_key(), store::to_document(REC_FOLDER, &sub)?)
                .await?;
            restored += 1;
        }
        let mut lineages: Vec<String> = Vec::new();
        for mut file in files {
            if !lineages.contains(&file.lineage_key) {
                lineages.push(file.lineage_key.clone());
            }
            self.restore_file_record(&mut file).await?;
            restored += 1;
        }
        for lineage_key in &lineages {
            self.reconcile_lineage(lineage_key).await?;
        }

        info!("Restored folder {} with {} item(s)", folder_id, restored);
        Ok(restored)
    }

    /// Everything currently recoverable from the trash.
    pub async fn list_trash(&self) -> Result<TrashListing> {
        let filter: ScanFilter = Arc::new(|doc: &Document| {
            is_status(doc, "deleted")
                && matches!(store::record_type(doc), Some(t) if t == REC_FILE || t == REC_FOLDER)
        });
        let docs = self.store.scan(filter).await?;

        let mut files = Vec::new();
        let mut folders = Vec::new();
        for doc in docs {
            match store::record_type(&doc) {
                Some(t) if t == REC_FILE => files.push(store::from_document(doc)?),
                Some(t) if t == REC_FOLDER => folders.push(store::from_document(doc)?),
                _ => {}
            }
        }
        Ok(TrashListing { files, folders })
    }

    /// One pass of the scheduled purge sweep.
    ///
    /// Flips every soft-deleted item whose deadline has passed to
    /// `permanently_deleted` (records stay for audit) and releases file
    /// blobs. Safe to run concurrently with itself: re-processing an already
    /// purged item is a no-op, and items with a future deadline are never
    /// touched.
    pub async fn run_purge_sweep(&self) -> Result<PurgeReport> {
        self.run_purge_sweep_at(Utc::now()).await
    }

    /// Sweep with an explicit clock, so the deadline logic stays testable.
    pub async fn run_purge_sweep_at(&self, now: DateTime<Utc>) -> Result<PurgeReport> {
        let filter: ScanFilter = Arc::new(move |doc: &Document| {
            let kind = store::record_type(doc);
            let lifecycle_match = matches!(kind, Some(t) if t == REC_FILE || t == REC_FOLDER);
            lifecycle_match && is_status(doc, "deleted") && deadline_passed(doc, now)
        });
        let expired = self.store.scan(filter).await?;

        let mut report = PurgeReport::default();
        for doc in expired {
            let kind = store::record_type(&doc).unwrap_or_default().to_string();
            let result = if kind == REC_FILE {
                self.purge_file(doc).await
            } else {
                self.purge_folder(doc).await
            };
            match result {
                Ok(true) if kind == REC_FILE => report.purged_files += 1,
                Ok(true) => report.purged_folders += 1,
                Ok(false) => {}
                Err(e) => {
                    // The sweep is periodic; a failed item is retried on the
                    // next run.
                    error!("Purge sweep failed to process a record: {}", e);
                }
            }
        }

        if report.purged_files > 0 || report.purged_folders > 0 {
            info!(
                "Purge sweep: {} file(s), {} folder(s) permanently deleted",
                report.purged_files, report.purged_folders
            );
        }
        Ok(report)
    }

    async fn purge_file(&self, doc: Document) -> Result<bool> {
        let mut file: FileRecord = store::from_document(doc)?;
        if file.lifecycle_status != LifecycleStatus::Deleted {
            return Ok(false);
        }
        file.lifecycle_status = LifecycleStatus::PermanentlyDeleted;
        file.updated_at = Utc::now();
        self.store
            .put(&file.record_key(), store::to_document(REC_FILE, &file)?)
            .await?;

        // Best-effort blob release; the record flip is what matters.
        if let Err(e) = self.blob.delete_blob(&file.storage_path).await {
            warn!("Failed to release blob '{}': {}", file.storage_path, e);
        }
        Ok(true)
    }

    async fn purge_folder(&self, doc: Document) -> Result<bool> {
        let mut folder: Folder = store::from_document(doc)?;
        if folder.lifecycle_status != LifecycleStatus::Deleted {
            return Ok(false);
        }
        folder.lifecycle_status = LifecycleStatus::PermanentlyDeleted;
        folder.updated_at = Utc::now();
        self.store
            .put(
                &folder.record_key(),
                store::to_document(REC_FOLDER, &folder)?,
            )
            .await?;
        Ok(true)
    }

    fn require_restorable(&self, status: LifecycleStatus) -> Result<()> {
        match status {
            LifecycleStatus::Deleted => Ok(()),
            LifecycleStatus::Active => Err(AppError::PreconditionFailed(
                "Item is not in the trash".to_string(),
            )),
            LifecycleStatus::PermanentlyDeleted => Err(AppError::PreconditionFailed(
                "Item has been permanently deleted".to_string(),
            )),
        }
    }

    async fn restore_file_record(&self, file: &mut FileRecord) -> Result<()> {
        file.lifecycle_status = LifecycleStatus::Active;
        file.deleted_at = None;
        file.deleted_by = None;
        file.scheduled_purge_at = None;
        file.updated_at = Utc::now();

        // Known defect upstream of the engine: display names corrupted into
        // an opaque hash while the original filename stayed intact. Repair
        // on the way out of the trash.
        if looks_like_opaque_hash(&file.display_name) && !file.original_filename.is_empty() {
            warn!(
                "Repairing corrupted display name '{}' from original filename '{}'",
                file.display_name, file.original_filename
            );
            file.display_name = file.original_filename.clone();
        }

        self.store
            .put(&file.record_key(), store::to_document(REC_FILE, file)?)
            .await
    }

    /// Re-establish the single-current rule after a restore.
    ///
    /// A fresh container may have been started while the old generation sat
    /// in the trash, so the restored lineage can briefly hold two `current`
    /// records. The newest one, by (generation, version number), keeps the
    /// mark; every other active member is demoted to `superseded`.
    async fn reconcile_lineage(&self, lineage_key: &str) -> Result<()> {
        let members = self.active_lineage_members(lineage_key).await?;
        let Some(winner) = members
            .iter()
            .max_by_key(|m| (m.lineage_generation, m.version_number, m.created_at))
            .map(|m| m.id)
        else {
            return Ok(());
        };

        for mut member in members {
            let wanted = if member.id == winner {
                VersionStatus::Current
            } else {
                VersionStatus::Superseded
            };
            if member.version_status == wanted {
                continue;
            }
            member.version_status = wanted;
            member.updated_at = Utc::now();
            self.store
                .put(
                    &member.record_key(),
                    store::to_document(REC_FILE, &member)?,
                )
                .await?;
        }
        Ok(())
    }

    async fn stamp_file_deleted(
        &self,
        file: &mut FileRecord,
        deleted_by: &str,
        now: DateTime<Utc>,
        deadline: DateTime<Utc>,
    ) -> Result<()> {
        file.lifecycle_status = LifecycleStatus::Deleted;
        file.deleted_at = Some(now);
        file.deleted_by = Some(deleted_by.to_string());
        file.scheduled_purge_at = Some(deadline);
        file.updated_at = now;
        self.store
            .put(&file.record_key(), store::to_document(REC_FILE, file)?)
            .await
    }

    async fn active_lineage_members(&self, lineage_key: &str) -> Result<Vec<FileRecord>> {
        let docs = self.store.query_index(IDX_BY_LINEAGE, lineage_key).await?;
        let mut members = Vec::new();
        for doc in docs {
            if store::record_type(&doc) != Some(REC_FILE) {
                continue;
            }
            let record: FileRecord = store::from_document(doc)?;
            if record.is_active() {
                members.push(record);
            }
        }
        Ok(members)
    }

    /// Breadth-first descent collecting the root folder, every active
    /// descendant folder, and every active file they contain.
    async fn collect_subtree(&self, root: Folder) -> Result<(Vec<Folder>, Vec<FileRecord>)> {
        let mut folders = vec![root];
        let mut files = Vec::new();
        let mut cursor = 0;

        while cursor < folders.len() {
            let parent_id = folders[cursor].id.to_string();
            cursor += 1;

            for doc in self
                .store
                .query_index(IDX_BY_FILE_PARENT, &parent_id)
                .await?
            {
                if store::record_type(&doc) != Some(REC_FILE) {
                    continue;
                }
                let file: FileRecord = store::from_document(doc)?;
                if file.is_active() {
                    files.push(file);
                }
            }
            for doc in self
                .store
                .query_index(IDX_BY_FOLDER_PARENT, &parent_id)
                .await?
            {
                if store::record_type(&doc) != Some(REC_FOLDER) {
                    continue;
                }
                let folder: Folder = store::from_document(doc)?;
                if folder.is_active() {
                    folders.push(folder);
                }
            }
        }
        Ok((folders, files))
    }

    /// Same descent, but collecting trashed items for a restore.
    async fn collect_deleted_subtree(
        &self,
        root: Folder,
    ) -> Result<(Vec<Folder>, Vec<FileRecord>)> {
        let mut folders = vec![root];
        let mut files = Vec::new();
        let mut cursor = 0;

        while cursor < folders.len() {
            let parent_id = folders[cursor].id.to_string();
            cursor += 1;

            for doc in self
                .store
                .query_index(IDX_BY_FILE_PARENT, &parent_id)
                .await?
            {
                if store::record_type(&doc) != Some(REC_FILE) {
                    continue;
                }
                let file: FileRecord = store::from_document(doc)?;
                if file.lifecycle_status == LifecycleStatus::Deleted {
                    files.push(file);
                }
            }
            for doc in self
                .store
                .query_index(IDX_BY_FOLDER_PARENT, &parent_id)
                .await?
            {
                if store::record_type(&doc) != Some(REC_FOLDER) {
                    continue;
                }
                let folder: Folder = store::from_document(doc)?;
                if folder.lifecycle_status == LifecycleStatus::Deleted {
                    folders.push(folder);
                }
            }
        }
        Ok((folders, files))
    }
}

fn is_status(doc: &Document, status: &str) -> bool {
    doc.get("lifecycle_status").and_then(|v| v.as_str()) == Some(status)
}

fn deadline_passed(doc: &Document, now: DateTime<Utc>) -> bool {
    doc.get("scheduled_purge_at")
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc) <= now)
        .unwrap_or(false)
}

/// Heuristic for the known display-name corruption: a long run of hex digits
/// with no extension is not a name a user typed.
fn looks_like_opaque_hash(name: &str) -> bool {
    name.len() >= 16 && name.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::files::models::VersionStatus;
    use crate::features::files::services::VersionService;
    use crate::modules::storage::BlobStore;
    use crate::shared::test_helpers::{
        force_display_name, test_scope, test_services, test_upload,
    };

    #[tokio::test]
    async fn test_container_delete_stamps_whole_lineage() {
        let (versions, trash, _) = test_services();
        let scope = test_scope();

        let first = versions
            .upload_new_version(test_upload("plan.pdf", scope.clone()))
            .await
            .unwrap();
        let second = versions
            .upload_new_version(test_upload("plan.pdf", scope.clone()))
            .await
            .unwrap();
        second.supersede.unwrap().await.unwrap();

        // Naming one version deletes the whole container.
        let affected = trash
            .soft_delete_file_container(first.file.id, "dana")
            .await
            .unwrap();
        assert_eq!(affected, 2);

        let key = first.file.lineage_key.clone();
        let trashed = versions.list_versions(&key, true).await.unwrap();
        assert_eq!(trashed.len(), 2);
        let deadlines: Vec<_> = trashed.iter().map(|f| f.scheduled_purge_at).collect();
        assert!(deadlines[0].is_some());
        // Same purge deadline across the container.
        assert_eq!(deadlines[0], deadlines[1]);
        assert!(trashed
            .iter()
            .all(|f| f.lifecycle_status == LifecycleStatus::Deleted));

        // Nothing visible outside the trash.
        assert!(versions.list_versions(&key, false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fresh_container_after_delete_restarts_at_one() {
        let (versions, trash, _) = test_services();
        let scope = test_scope();

        for _ in 0..3 {
            let outcome = versions
                .upload_new_version(test_upload("plan.pdf", scope.clone()))
                .await
                .unwrap();
            if let Some(handle) = outcome.supersede {
                handle.await.unwrap();
            }
        }

        let key = VersionService::lineage_key(&scope, "plan.pdf");
        let latest = versions.list_versions(&key, false).await.unwrap()[0].clone();
        trash
            .soft_delete_file_container(latest.id, "dana")
            .await
            .unwrap();

        // Zero active members: the next upload starts a fresh container.
        let fresh = versions
            .upload_new_version(test_upload("plan.pdf", scope.clone()))
            .await
            .unwrap();
        assert_eq!(fresh.file.version_label, "1.0");
        assert_eq!(fresh.file.version_status, VersionStatus::Current);
        assert_eq!(fresh.file.lineage_generation, latest.lineage_generation + 1);
    }

    #[tokio::test]
    async fn test_delete_requires_active_file() {
        let (versions, trash, _) = test_services();

        let outcome = versions
            .upload_new_version(test_upload("plan.pdf", test_scope()))
            .await
            .unwrap();
        trash
            .soft_delete_file_container(outcome.file.id, "dana")
            .await
            .unwrap();

        let err = trash
            .soft_delete_file_container(outcome.file.id, "dana")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PreconditionFailed(_)));
    }

    #[tokio::test]
    async fn test_folder_delete_cascades_to_grandchildren() {
        let (versions, trash, _) = test_services();

        let top = trash.create_folder("contracts", None, "erin").await.unwrap();
        let nested = trash
            .create_folder("2026", Some(top.id), "erin")
            .await
            .unwrap();

        let mut scope = test_scope();
        scope.folder_id = Some(nested.id);
        versions
            .upload_new_version(test_upload("lease.pdf", scope))
            .await
            .unwrap();

        // Root folder + nested folder + one file, all in one batch.
        let affected = trash.soft_delete_folder(top.id, "erin").await.unwrap();
        assert_eq!(affected, 3);

        let nested_after = trash.get_folder(nested.id).await.unwrap();
        assert_eq!(nested_after.lifecycle_status, LifecycleStatus::Deleted);
        assert_eq!(
            nested_after.scheduled_purge_at,
            trash.get_folder(top.id).await.unwrap().scheduled_purge_at
        );
    }

    #[tokio::test]
    async fn test_restore_round_trip() {
        let (versions, trash, _) = test_services();
        let scope = test_scope();

        let outcome = versions
            .upload_new_version(test_upload("plan.pdf", scope.clone()))
            .await
            .unwrap();
        trash
            .soft_delete_file_container(outcome.file.id, "dana")
            .await
            .unwrap();

        let restored = trash.restore_file(outcome.file.id).await.unwrap();
        assert_eq!(restored, 1);

        let key = outcome.file.lineage_key.clone();
        let listed = versions.list_versions(&key, false).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].deleted_at.is_none());
        assert!(listed[0].scheduled_purge_at.is_none());
    }

    #[tokio::test]
    async fn test_restore_after_fresh_generation_keeps_single_current() {
        let (versions, trash, _) = test_services();
        let scope = test_scope();

        let first = versions
            .upload_new_version(test_upload("plan.pdf", scope.clone()))
            .await
            .unwrap();
        let second = versions
            .upload_new_version(test_upload("plan.pdf", scope.clone()))
            .await
            .unwrap();
        second.supersede.unwrap().await.unwrap();
        trash
            .soft_delete_file_container(first.file.id, "dana")
            .await
            .unwrap();

        // A fresh container starts while the old generation is in the trash.
        let fresh = versions
            .upload_new_version(test_upload("plan.pdf", scope.clone()))
            .await
            .unwrap();
        assert_eq!(fresh.file.version_label, "1.0");

        // Restoring the old generation must not bring back a second
        // `current`: the newest generation keeps the mark.
        trash.restore_file(second.file.id).await.unwrap();

        let listed = versions
            .list_versions(&fresh.file.lineage_key, false)
            .await
            .unwrap();
        assert_eq!(listed.len(), 3);
        let current: Vec<_> = listed
            .iter()
            .filter(|f| f.version_status == VersionStatus::Current)
            .collect();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].id, fresh.file.id);
    }

    #[tokio::test]
    async fn test_restore_folder_keeps_single_current_per_lineage() {
        let (versions, trash, _) = test_services();

        let folder = trash.create_folder("drafts", None, "erin").await.unwrap();
        let mut scope = test_scope();
        scope.folder_id = Some(folder.id);

        let old = versions
            .upload_new_version(test_upload("lease.pdf", scope.clone()))
            .await
            .unwrap();
        trash.soft_delete_folder(folder.id, "erin").await.unwrap();

        let fresh = versions
            .upload_new_version(test_upload("lease.pdf", scope.clone()))
            .await
            .unwrap();

        trash.restore_folder(folder.id).await.unwrap();

        let listed = versions
            .list_versions(&old.file.lineage_key, false)
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
        let current: Vec<_> = listed
            .iter()
            .filter(|f| f.version_status == VersionStatus::Current)
            .collect();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].id, fresh.file.id);
    }

    #[tokio::test]
    async fn test_restore_rejects_active_and_purged_items() {
        let (versions, trash, _) = test_services();

        let outcome = versions
            .upload_new_version(test_upload("plan.pdf", test_scope()))
            .await
            .unwrap();

        // Active: nothing to restore.
        let err = trash.restore_file(outcome.file.id).await.unwrap_err();
        assert!(matches!(err, AppError::PreconditionFailed(_)));

        trash
            .soft_delete_file_container(outcome.file.id, "dana")
            .await
            .unwrap();
        let future = Utc::now() + Duration::days(90);
        trash.run_purge_sweep_at(future).await.unwrap();

        // Purged: terminal.
        let err = trash.restore_file(outcome.file.id).await.unwrap_err();
        assert!(matches!(err, AppError::PreconditionFailed(_)));
    }

    #[tokio::test]
    async fn test_restore_repairs_opaque_hash_display_name() {
        let (versions, trash, store) = test_services();

        let outcome = versions
            .upload_new_version(test_upload("site-plan.dwg", test_scope()))
            .await
            .unwrap();
        trash
            .soft_delete_file_container(outcome.file.id, "dana")
            .await
            .unwrap();

        // Simulate the upstream corruption while the file sits in the trash.
        force_display_name(&store, &outcome.file, "3f9ab2c47d11e08a5b6c9d0e1f2a3b4c").await;

        trash.restore_file(outcome.file.id).await.unwrap();
        let restored = versions
            .list_versions(&outcome.file.lineage_key, false)
            .await
            .unwrap();
        assert_eq!(restored[0].display_name, "site-plan.dwg");
    }

    #[tokio::test]
    async fn test_restore_folder_cascades() {
        let (versions, trash, _) = test_services();

        let top = trash.create_folder("contracts", None, "erin").await.unwrap();
        let nested = trash
            .create_folder("2026", Some(top.id), "erin")
            .await
            .unwrap();
        let mut scope = test_scope();
        scope.folder_id = Some(nested.id);
        let upload = versions
            .upload_new_version(test_upload("lease.pdf", scope))
            .await
            .unwrap();

        trash.soft_delete_folder(top.id, "erin").await.unwrap();
        let restored = trash.restore_folder(top.id).await.unwrap();
        assert_eq!(restored, 3);

        assert!(trash.get_folder(nested.id).await.unwrap().is_active());
        let listed = versions
            .list_versions(&upload.file.lineage_key, false)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_purge_sweep_honors_deadline_and_is_idempotent() {
        let (versions, trash, _) = test_services();

        let outcome = versions
            .upload_new_version(test_upload("plan.pdf", test_scope()))
            .await
            .unwrap();
        trash
            .soft_delete_file_container(outcome.file.id, "dana")
            .await
            .unwrap();

        // Deadline not reached: nothing purged.
        let report = trash.run_purge_sweep().await.unwrap();
        assert_eq!(report.purged_files, 0);

        let future = Utc::now() + Duration::days(61);
        let report = trash.run_purge_sweep_at(future).await.unwrap();
        assert_eq!(report.purged_files, 1);

        // Re-running over already purged items is a no-op.
        let report = trash.run_purge_sweep_at(future).await.unwrap();
        assert_eq!(report.purged_files, 0);

        // Purged versions are gone even from the trash view.
        let listed = versions
            .list_versions(&outcome.file.lineage_key, true)
            .await
            .unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_purge_releases_content_blobs() {
        let (versions, trash, _store) = test_services();
        let blob = trash.blob.clone();

        let outcome = versions
            .upload_new_version(test_upload("plan.pdf", test_scope()))
            .await
            .unwrap();
        assert!(blob.get_blob(&outcome.file.storage_path).await.is_ok());

        trash
            .soft_delete_file_container(outcome.file.id, "dana")
            .await
            .unwrap();
        trash
            .run_purge_sweep_at(Utc::now() + Duration::days(61))
            .await
            .unwrap();

        assert!(blob.get_blob(&outcome.file.storage_path).await.is_err());
    }

    #[tokio::test]
    async fn test_list_trash_shows_deleted_items_only() {
        let (versions, trash, _) = test_services();

        let kept = versions
            .upload_new_version(test_upload("keep.pdf", test_scope()))
            .await
            .unwrap();
        let dropped = versions
            .upload_new_version(test_upload("drop.pdf", test_scope()))
            .await
            .unwrap();
        trash
            .soft_delete_file_container(dropped.file.id, "dana")
            .await
            .unwrap();

        let listing = trash.list_trash().await.unwrap();
        assert_eq!(listing.files.len(), 1);
        assert_eq!(listing.files[0].id, dropped.file.id);
        assert!(listing.files.iter().all(|f| f.id != kept.file.id));
    }
}
