use thiserror::Error;

/// Failure reported by the query oracle. Carried to the caller verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("oracle error: {detail}")]
pub struct OracleError {
    pub detail: String,
}

impl OracleError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

pub type OracleResult<T> = Result<T, OracleError>;
