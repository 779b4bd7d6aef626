use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::modules::store::RecordKey;

/// Status of one record inside its version lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionStatus {
    /// The version readers should see as "the file".
    Current,
    /// An older version kept for history.
    Superseded,
}

/// Lifecycle state of a file or folder.
///
/// `active -> deleted` on soft-delete, `deleted -> active` on restore,
/// `deleted -> permanently_deleted` once the purge deadline passes.
/// `permanently_deleted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    Active,
    Deleted,
    PermanentlyDeleted,
}

impl LifecycleStatus {
    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}

/// The (project, task, folder) scope an upload belongs to. Uploads sharing an
/// original filename within one scope form one version lineage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FileScope {
    pub project_id: Option<String>,
    pub task_id: Option<String>,
    pub folder_id: Option<Uuid>,
}

impl FileScope {
    /// Stable partition key for this scope. All file records of a scope
    /// share one partition so version lookups are partition queries.
    pub fn partition_key(&self) -> String {
        format!(
            "scope#p:{}#t:{}#f:{}",
            self.project_id.as_deref().unwrap_or("-"),
            self.task_id.as_deref().unwrap_or("-"),
            self.folder_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
        )
    }
}

/// Short sort-key-safe digest of an original filename. Case-insensitive:
/// "Plan.PDF" and "plan.pdf" belong to the same lineage.
pub fn lineage_slug(original_filename: &str) -> String {
    let digest = Sha256::digest(original_filename.trim().to_lowercase().as_bytes());
    hex::encode(&digest[..8])
}

/// Full lineage key for (original filename, scope).
pub fn lineage_key(scope: &FileScope, original_filename: &str) -> String {
    format!(
        "{}#{}",
        scope.partition_key(),
        lineage_slug(original_filename)
    )
}

/// One stored version of a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: Uuid,
    /// Name shown to users. Normally the original filename; repaired from it
    /// on restore when a past defect replaced it with an opaque hash.
    pub display_name: String,
    pub original_filename: String,
    pub file_size: i64,
    pub content_type: String,
    /// Opaque path of the content blob.
    pub storage_path: String,
    pub scope: FileScope,
    pub lineage_key: String,
    /// Monotonic per lineage generation, starting at 1.
    pub version_number: u32,
    /// User-facing label, e.g. "1.0", "2.0".
    pub version_label: String,
    pub version_status: VersionStatus,
    /// Bumped every time an emptied lineage starts over at version 1.
    pub lineage_generation: u32,
    /// Review stage the file was uploaded for. Informational only.
    pub workflow_state: Option<String>,
    pub lifecycle_status: LifecycleStatus,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
    pub scheduled_purge_at: Option<DateTime<Utc>>,
    pub parent_folder_id: Option<Uuid>,
    pub uploaded_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn record_key(&self) -> RecordKey {
        RecordKey::new(
            self.scope.partition_key(),
            format!(
                "file#{}#{}",
                lineage_slug(&self.original_filename),
                self.id
            ),
        )
    }

    pub fn version_label(version_number: u32) -> String {
        format!("{}.0", version_number)
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle_status.is_active()
    }
}

/// Per-lineage bookkeeping record backing race-free version assignment.
///
/// Every assignment rewrites the head through a conditional write on
/// `revision`, so two racing uploads cannot both claim the same number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineageHead {
    pub lineage_key: String,
    pub generation: u32,
    pub last_version: u32,
    pub revision: u64,
}

impl LineageHead {
    pub fn record_key(scope: &FileScope, original_filename: &str) -> RecordKey {
        RecordKey::new(
            scope.partition_key(),
            format!("lineage#{}", lineage_slug(original_filename)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lineage_key_ignores_filename_case() {
        let scope = FileScope {
            project_id: Some("p1".into()),
            task_id: None,
            folder_id: None,
        };
        assert_eq!(
            lineage_key(&scope, "Plan.PDF"),
            lineage_key(&scope, "plan.pdf")
        );
    }

    #[test]
    fn test_lineage_key_differs_across_scopes() {
        let a = FileScope {
            project_id: Some("p1".into()),
            ..Default::default()
        };
        let b = FileScope {
            project_id: Some("p2".into()),
            ..Default::default()
        };
        assert_ne!(lineage_key(&a, "plan.pdf"), lineage_key(&b, "plan.pdf"));
    }

    #[test]
    fn test_version_label_format() {
        assert_eq!(FileRecord::version_label(1), "1.0");
        assert_eq!(FileRecord::version_label(12), "12.0");
    }
}
