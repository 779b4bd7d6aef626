use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::features::files::models::{PermissionTier, ResourceType};

/// Request to create a shareable link.
///
/// `resource_type` and `permission` arrive as strings from the (out of scope)
/// HTTP layer; the service validates them before touching the store.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLinkRequest {
    pub resource_type: String,
    pub resource_id: String,
    pub permission: String,
    #[serde(default)]
    pub is_public: bool,
    pub password: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_uses: Option<i64>,
    pub metadata: Option<serde_json::Value>,
    pub created_by: String,
}

/// Patch-style update for an existing link. `None` fields are left alone;
/// the `clear_*` flags remove an optional setting.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLinkRequest {
    pub permission: Option<String>,
    pub is_public: Option<bool>,
    pub password: Option<String>,
    #[serde(default)]
    pub clear_password: bool,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub clear_expiry: bool,
    pub max_uses: Option<i64>,
    #[serde(default)]
    pub clear_max_uses: bool,
    pub is_active: Option<bool>,
    pub metadata: Option<serde_json::Value>,
}

/// What a successful link resolution grants the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedLink {
    pub permission: PermissionTier,
    pub resource_type: ResourceType,
    pub resource_id: String,
    pub is_public: bool,
}
