pub mod file;
pub mod folder;
pub mod shareable_link;

pub use file::{FileRecord, FileScope, LifecycleStatus, LineageHead, VersionStatus};
pub use folder::Folder;
pub use shareable_link::{PermissionTier, ResourceType, ShareableLink};

/// Record-type tags stored on every document so scans can tell record kinds
/// apart.
pub const REC_FILE: &str = "file";
pub const REC_FOLDER: &str = "folder";
pub const REC_LINK: &str = "link";
pub const REC_LINEAGE: &str = "lineage";
