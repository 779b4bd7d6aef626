pub mod file_dto;
pub mod link_dto;

pub use file_dto::{PurgeReport, TrashListing, UploadNewVersionRequest};
pub use link_dto::{CreateLinkRequest, ResolvedLink, UpdateLinkRequest};
