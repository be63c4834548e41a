use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
/// Errors returned by a shared-tier backend.
pub enum SharedStoreError {
    /// Backend could not be reached.
    #[error("shared store unavailable: {reason}")]
    Unavailable {
        /// Error message.
        reason: String,
    },

    /// Backend refused the write (quota, size limit, ...).
    #[error("shared store rejected write: {reason}")]
    Rejected {
        /// Error message.
        reason: String,
    },
}

/// Convenience result type for shared-tier operations.
pub type SharedStoreResult<T> = Result<T, SharedStoreError>;
