//! Error taxonomy shared by the store and the HTTP layer.

/// Errors reported by tracker operations.
///
/// Nothing is retried inside the crate; every variant reaches the immediate
/// caller, and a failed write has no partial effect.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// The entity does not exist, or exists but belongs to someone else.
    /// The two cases are deliberately indistinguishable.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The request conflicts with the entity's current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A multi-row write could not commit and was rolled back.
    #[error("Transaction failed: {0}")]
    Transaction(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// A convenience alias for `Result<T, TrackerError>`.
pub type Result<T> = std::result::Result<T, TrackerError>;
