use thiserror::Error;

use crate::canonical::CanonicalError;
use crate::oracle::OracleError;

/// Failures surfaced by [`super::CacheOrchestrator`].
///
/// Cache-layer problems never appear here; they are reported as degraded results.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// The query text could not be split into clause zones. Never cached or retried.
    #[error("malformed query: {0}")]
    Malformed(#[from] CanonicalError),

    /// The oracle failed. Never cached or retried.
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

/// Convenience result type for orchestrator calls.
pub type QueryOutcome<T> = Result<T, QueryError>;
