//! Persistent store adapter
//!
//! Narrow interface over a partitioned key-value document store. All lifecycle
//! services depend on the [`DocumentStore`] trait, never on a concrete
//! backend; the in-memory implementation backs tests and the local harness,
//! and any partitioned document store (DynamoDB-style) can implement it.

mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::core::error::{AppError, Result};

pub use memory::{IndexDef, MemoryStore};

/// A stored document. The engine persists plain JSON so that backends with
/// schemaless items can store records verbatim.
pub type Document = serde_json::Value;

/// Predicate used by [`DocumentStore::scan`].
pub type ScanFilter = Arc<dyn Fn(&Document) -> bool + Send + Sync>;

/// Secondary index over the `id` field (file/folder lookup by identity).
pub const IDX_BY_ID: &str = "by_id";
/// Secondary index over the `lineage_key` field (version-history lookup).
pub const IDX_BY_LINEAGE: &str = "by_lineage";
/// Secondary index over the `parent_folder_id` field of file records.
pub const IDX_BY_FILE_PARENT: &str = "by_file_parent";
/// Secondary index over the `parent_id` field of folder records.
pub const IDX_BY_FOLDER_PARENT: &str = "by_folder_parent";
/// Secondary index over the `resource_key` field of shareable links.
pub const IDX_BY_RESOURCE: &str = "by_resource";

/// Composite key addressing one document: hash/partition key plus range/sort
/// key, matching the layout of partitioned KV stores.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey {
    pub partition: String,
    pub sort: String,
}

impl RecordKey {
    pub fn new(partition: impl Into<String>, sort: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: sort.into(),
        }
    }
}

/// Condition for a conditional write.
#[derive(Debug, Clone)]
pub enum Expected {
    /// Apply only when no document exists under the key.
    Absent,
    /// Apply only when the stored document's field equals the given value.
    /// This is the compare-and-swap primitive used for race-free version
    /// assignment.
    FieldEquals(String, serde_json::Value),
}

/// Abstract contract over a partitioned key-value document store.
///
/// `query_partition` serves scope-bounded lookups (all versions in one
/// project/task/folder scope); `query_index` serves reverse lookups through a
/// declared secondary index; `scan` is the O(n) fallback a richer backend may
/// replace with an indexed query.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Unconditional upsert (last-write-wins).
    async fn put(&self, key: &RecordKey, item: Document) -> Result<()>;

    /// Conditional write. Returns `true` when the condition held and the
    /// write was applied, `false` when it did not (no write performed).
    async fn put_if(&self, key: &RecordKey, item: Document, expected: Expected) -> Result<bool>;

    async fn get(&self, key: &RecordKey) -> Result<Option<Document>>;

    async fn delete(&self, key: &RecordKey) -> Result<()>;

    /// All documents in a partition whose sort key starts with `sort_prefix`,
    /// in sort-key order.
    async fn query_partition(&self, partition: &str, sort_prefix: &str) -> Result<Vec<Document>>;

    /// All documents whose indexed field equals `index_key`.
    async fn query_index(&self, index_name: &str, index_key: &str) -> Result<Vec<Document>>;

    /// Every document matching the predicate.
    async fn scan(&self, filter: ScanFilter) -> Result<Vec<Document>>;

    /// Atomically increment a numeric field, guarded by an upper bound.
    ///
    /// Returns the new value, or `None` when the document is absent or the
    /// field already reached `limit`. Used for shareable-link use counting so
    /// concurrent resolutions cannot exceed the cap.
    async fn increment_within_limit(
        &self,
        key: &RecordKey,
        field: &str,
        limit: Option<i64>,
    ) -> Result<Option<i64>>;
}

pub type DocumentStoreRef = Arc<dyn DocumentStore>;

/// Serialize a record into a store document, tagging it with its record type
/// so scans can distinguish files, folders, links, and lineage heads.
pub fn to_document<T: Serialize>(record_type: &str, value: &T) -> Result<Document> {
    let mut doc = serde_json::to_value(value)
        .map_err(|e| AppError::Internal(format!("Failed to serialize record: {}", e)))?;
    doc["record_type"] = serde_json::Value::String(record_type.to_string());
    Ok(doc)
}

/// Deserialize a store document back into a record, ignoring the tag.
pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T> {
    serde_json::from_value(doc)
        .map_err(|e| AppError::StoreUnavailable(format!("Malformed stored record: {}", e)))
}

/// Read the `record_type` tag of a document.
pub fn record_type(doc: &Document) -> Option<&str> {
    doc.get("record_type").and_then(|v| v.as_str())
}
