//! In-memory document store
//!
//! Reference implementation of [`DocumentStore`] used by tests and the local
//! harness binary. Partition/sort keys live in one ordered map so prefix
//! queries are range scans; secondary indexes are rebuilt incrementally on
//! every write.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::core::error::{AppError, Result};

use super::{Document, DocumentStore, Expected, RecordKey, ScanFilter};

/// Declaration of a secondary index: index name plus the document field it
/// projects.
#[derive(Debug, Clone)]
pub struct IndexDef {
    pub name: &'static str,
    pub field: &'static str,
}

#[derive(Default)]
struct Tables {
    /// Primary table keyed by (partition, sort).
    items: BTreeMap<(String, String), Document>,
    /// index name -> field value -> keys of matching documents.
    indexes: HashMap<&'static str, HashMap<String, Vec<(String, String)>>>,
}

pub struct MemoryStore {
    index_defs: Vec<IndexDef>,
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new(index_defs: Vec<IndexDef>) -> Self {
        Self {
            index_defs,
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Store with every index the lifecycle engine declares.
    pub fn with_engine_indexes() -> Self {
        Self::new(vec![
            IndexDef {
                name: super::IDX_BY_ID,
                field: "id",
            },
            IndexDef {
                name: super::IDX_BY_LINEAGE,
                field: "lineage_key",
            },
            IndexDef {
                name: super::IDX_BY_FILE_PARENT,
                field: "parent_folder_id",
            },
            IndexDef {
                name: super::IDX_BY_FOLDER_PARENT,
                field: "parent_id",
            },
            IndexDef {
                name: super::IDX_BY_RESOURCE,
                field: "resource_key",
            },
        ])
    }

    fn index_value(doc: &Document, field: &str) -> Option<String> {
        match doc.get(field)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn unindex(&self, tables: &mut Tables, key: &(String, String), doc: &Document) {
        for def in &self.index_defs {
            if let Some(value) = Self::index_value(doc, def.field) {
                if let Some(bucket) = tables
                    .indexes
                    .get_mut(def.name)
                    .and_then(|m| m.get_mut(&value))
                {
                    bucket.retain(|k| k != key);
                }
            }
        }
    }

    fn index(&self, tables: &mut Tables, key: &(String, String), doc: &Document) {
        for def in &self.index_defs {
            if let Some(value) = Self::index_value(doc, def.field) {
                tables
                    .indexes
                    .entry(def.name)
                    .or_default()
                    .entry(value)
                    .or_default()
                    .push(key.clone());
            }
        }
    }

    fn insert(&self, tables: &mut Tables, key: (String, String), doc: Document) {
        if let Some(old) = tables.items.get(&key).cloned() {
            self.unindex(tables, &key, &old);
        }
        self.index(tables, &key, &doc);
        tables.items.insert(key, doc);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn put(&self, key: &RecordKey, item: Document) -> Result<()> {
        let mut tables = self.tables.write().await;
        self.insert(
            &mut tables,
            (key.partition.clone(), key.sort.clone()),
            item,
        );
        Ok(())
    }

    async fn put_if(&self, key: &RecordKey, item: Document, expected: Expected) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let map_key = (key.partition.clone(), key.sort.clone());
        let holds = match (&expected, tables.items.get(&map_key)) {
            (Expected::Absent, existing) => existing.is_none(),
            (Expected::FieldEquals(field, value), Some(existing)) => {
                existing.get(field) == Some(value)
            }
            (Expected::FieldEquals(_, _), None) => false,
        };
        if holds {
            self.insert(&mut tables, map_key, item);
        }
        Ok(holds)
    }

    async fn get(&self, key: &RecordKey) -> Result<Option<Document>> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .get(&(key.partition.clone(), key.sort.clone()))
            .cloned())
    }

    async fn delete(&self, key: &RecordKey) -> Result<()> {
        let mut tables = self.tables.write().await;
        let map_key = (key.partition.clone(), key.sort.clone());
        if let Some(doc) = tables.items.remove(&map_key) {
            self.unindex(&mut tables, &map_key, &doc);
        }
        Ok(())
    }

    async fn query_partition(&self, partition: &str, sort_prefix: &str) -> Result<Vec<Document>> {
        let tables = self.tables.read().await;
        let lower = (partition.to_string(), sort_prefix.to_string());
        let results = tables
            .items
            .range((Bound::Included(lower), Bound::Unbounded))
            .take_while(|((p, s), _)| p == partition && s.starts_with(sort_prefix))
            .map(|(_, doc)| doc.clone())
            .collect();
        Ok(results)
    }

    async fn query_index(&self, index_name: &str, index_key: &str) -> Result<Vec<Document>> {
        if !self.index_defs.iter().any(|d| d.name == index_name) {
            return Err(AppError::StoreUnavailable(format!(
                "Unknown index '{}'",
                index_name
            )));
        }
        let tables = self.tables.read().await;
        let keys = tables
            .indexes
            .get(index_name)
            .and_then(|m| m.get(index_key))
            .cloned()
            .unwrap_or_default();
        Ok(keys
            .iter()
            .filter_map(|k| tables.items.get(k).cloned())
            .collect())
    }

    async fn scan(&self, filter: ScanFilter) -> Result<Vec<Document>> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .values()
            .filter(|doc| filter(doc))
            .cloned()
            .collect())
    }

    async fn increment_within_limit(
        &self,
        key: &RecordKey,
        field: &str,
        limit: Option<i64>,
    ) -> Result<Option<i64>> {
        let mut tables = self.tables.write().await;
        let map_key = (key.partition.clone(), key.sort.clone());
        let Some(doc) = tables.items.get(&map_key).cloned() else {
            return Ok(None);
        };
        let current = doc.get(field).and_then(|v| v.as_i64()).unwrap_or(0);
        if let Some(limit) = limit {
            if current >= limit {
                return Ok(None);
            }
        }
        let mut updated = doc;
        updated[field] = serde_json::Value::from(current + 1);
        self.insert(&mut tables, map_key, updated);
        Ok(Some(current + 1))
    }
}
