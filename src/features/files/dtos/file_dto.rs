use serde::{Deserialize, Serialize};

use crate::features::files::models::{FileRecord, FileScope, Folder};

/// Descriptor for uploading a new version of a file container.
#[derive(Debug, Clone)]
pub struct UploadNewVersionRequest {
    /// Original filename; together with the scope it selects the lineage.
    pub original_filename: String,
    /// Display name override. Defaults to the original filename.
    pub display_name: Option<String>,
    pub content_type: String,
    pub data: Vec<u8>,
    pub scope: FileScope,
    pub uploaded_by: String,
    /// Review stage the upload belongs to. Informational only.
    pub workflow_state: Option<String>,
}

/// Outcome of one purge sweep run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurgeReport {
    pub purged_files: usize,
    pub purged_folders: usize,
}

/// Soft-deleted items currently recoverable from the trash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrashListing {
    pub files: Vec<FileRecord>,
    pub folders: Vec<Folder>,
}
