use thiserror::Error;

/// Engine-wide error type.
///
/// Every public operation of the lifecycle engine fails with one of these
/// kinds. Callers (the HTTP layer lives outside this crate) map them to
/// their own status codes; messages are safe to show to untrusted callers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Partial failure: {0} ({1} of {2} applied)")]
    PartialFailure(String, usize, usize),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
