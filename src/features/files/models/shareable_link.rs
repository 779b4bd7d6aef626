use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::{AppError, Result};
use crate::modules::store::RecordKey;

/// Kind of resource a shareable link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    File,
    Folder,
}

impl ResourceType {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "file" => Ok(Self::File),
            "folder" => Ok(Self::Folder),
            other => Err(AppError::InvalidArgument(format!(
                "Invalid resource type '{}', expected 'file' or 'folder'",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Folder => "folder",
        }
    }
}

/// What a resolved link allows the holder to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionTier {
    View,
    Download,
    Edit,
}

impl PermissionTier {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "view" => Ok(Self::View),
            "download" => Ok(Self::Download),
            "edit" => Ok(Self::Edit),
            other => Err(AppError::InvalidArgument(format!(
                "Invalid permission tier '{}', expected 'view', 'download' or 'edit'",
                other
            ))),
        }
    }
}

/// Token-addressed grant of access to one file or folder, optionally
/// password-protected, time-limited, or use-capped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareableLink {
    /// Opaque token; doubles as the record id.
    pub token: String,
    pub resource_type: ResourceType,
    pub resource_id: String,
    pub permission: PermissionTier,
    pub is_public: bool,
    /// sha-256 hex of the password, when one is set.
    pub password_hash: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_uses: Option<i64>,
    pub current_uses: i64,
    pub created_by: String,
    pub is_active: bool,
    pub metadata: Option<serde_json::Value>,
    /// Denormalized `{type}#{id}` index field for resource -> links lookups.
    pub resource_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShareableLink {
    pub fn record_key(&self) -> RecordKey {
        Self::key_for(&self.token)
    }

    pub fn key_for(token: &str) -> RecordKey {
        RecordKey::new("links", token.to_string())
    }

    pub fn resource_key(resource_type: ResourceType, resource_id: &str) -> String {
        format!("{}#{}", resource_type.as_str(), resource_id)
    }
}
