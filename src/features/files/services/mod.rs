pub mod link_service;
pub mod trash_service;
pub mod version_service;

pub use link_service::LinkService;
pub use trash_service::TrashService;
pub use version_service::{UploadOutcome, VersionService};

use uuid::Uuid;

use crate::core::error::Result;
use crate::features::files::models::{FileRecord, Folder, REC_FILE, REC_FOLDER};
use crate::modules::store::{self, DocumentStore, IDX_BY_ID};

/// Resolve a file by id through the identity index.
pub(crate) async fn find_file(
    store: &dyn DocumentStore,
    id: Uuid,
) -> Result<Option<FileRecord>> {
    let docs = store.query_index(IDX_BY_ID, &id.to_string()).await?;
    for doc in docs {
        if store::record_type(&doc) == Some(REC_FILE) {
            return Ok(Some(store::from_document(doc)?));
        }
    }
    Ok(None)
}

/// Resolve a folder by id through the identity index.
pub(crate) async fn find_folder(
    store: &dyn DocumentStore,
    id: Uuid,
) -> Result<Option<Folder>> {
    let docs = store.query_index(IDX_BY_ID, &id.to_string()).await?;
    for doc in docs {
        if store::record_type(&doc) == Some(REC_FOLDER) {
            return Ok(Some(store::from_document(doc)?));
        }
    }
    Ok(None)
}
