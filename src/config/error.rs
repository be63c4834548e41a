//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::cache::ParseStorageModeError;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric variable could not be parsed.
    #[error("failed to parse {name}='{value}': {source}")]
    InvalidNumber {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// A numeric setting parsed but is unusable.
    #[error("invalid {name}='{value}': {reason}")]
    OutOfRange {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    /// `CANON_STORAGE_MODE` is not a known mode.
    #[error("invalid CANON_STORAGE_MODE: {source}")]
    InvalidStorageMode {
        #[source]
        source: ParseStorageModeError,
    },

    /// Specified path does not exist on the filesystem.
    #[error("path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    /// Path exists but is not a file (when a file was expected).
    #[error("path is not a file: {path}")]
    NotAFile { path: PathBuf },
}
