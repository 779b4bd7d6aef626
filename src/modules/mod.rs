//! Modules layer - Infrastructure adapters for external backends
//!
//! Contains the partitioned document-store adapter and the content-blob
//! storage client the lifecycle services are wired with.

pub mod storage;
pub mod store;
