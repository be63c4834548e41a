use std::path::PathBuf;

use thiserror::Error;

use crate::orchestrator::QueryError;

/// Errors raised while loading or resolving named queries.
///
/// Every resolution failure is reported before the oracle is called.
#[derive(Debug, Error)]
pub enum NamedQueryError {
    #[error("unknown named query '{name}'")]
    UnknownDefinition { name: String },

    #[error("named query '{name}' is inactive")]
    InactiveDefinition { name: String },

    #[error("parameter '{parameter}' is not allowed by named query '{name}'")]
    UnknownParameter { name: String, parameter: String },

    #[error("named query '{name}' requires parameter '{parameter}'")]
    MissingParameter { name: String, parameter: String },

    /// The definition itself is unusable (bad template, duplicate name, ...).
    #[error("invalid named query '{name}': {reason}")]
    InvalidDefinition { name: String, reason: String },

    #[error("failed to read registry {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse registry: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Query(#[from] QueryError),
}

pub type NamedQueryResult<T> = Result<T, NamedQueryError>;
