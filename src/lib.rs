//! File lifecycle engine for the Taskfolio platform.
//!
//! Three managers over a partitioned key-value document store and a content
//! blob backend:
//!
//! - [`features::files::VersionService`] treats uploads sharing an original
//!   filename within one (project, task, folder) scope as one versioned
//!   container;
//! - [`features::files::TrashService`] soft-deletes containers and folder
//!   subtrees into a recoverable trash with a scheduled permanent purge;
//! - [`features::files::LinkService`] issues and resolves time/usage-bounded
//!   shareable links with a TTL'd listing cache.
//!
//! The HTTP layer, authentication, and the rest of the platform consume these
//! services; they are not part of this crate. Services are constructed with
//! explicit `Arc<dyn DocumentStore>` / `Arc<dyn BlobStore>` handles: wiring
//! happens once at process start, no ambient lookup.

pub mod core;
pub mod features;
pub mod modules;
pub mod shared;

pub use crate::core::config::Config;
pub use crate::core::error::{AppError, Result};
pub use crate::features::files::{LinkService, TrashService, VersionService};
