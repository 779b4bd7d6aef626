use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modules::store::RecordKey;

use super::LifecycleStatus;

/// A folder in the tenant's file tree. Deleting a folder cascades to every
/// descendant folder and contained file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    pub id: Uuid,
    pub name: String,
    /// `None` = root.
    pub parent_id: Option<Uuid>,
    pub created_by: String,
    pub lifecycle_status: LifecycleStatus,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
    pub scheduled_purge_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    pub fn new(name: String, parent_id: Option<Uuid>, created_by: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            parent_id,
            created_by,
            lifecycle_status: LifecycleStatus::Active,
            deleted_at: None,
            deleted_by: None,
            scheduled_purge_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn record_key(&self) -> RecordKey {
        Self::key_for(self.id)
    }

    pub fn key_for(id: Uuid) -> RecordKey {
        RecordKey::new("folders", format!("folder#{}", id))
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle_status.is_active()
    }
}
