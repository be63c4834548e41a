use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("failed to encode payload: {0}")]
    Encode(String),

    #[error("failed to decode payload: {0}")]
    Decode(String),

    #[error("blob is too short to carry a version header ({len} bytes)")]
    Truncated { len: usize },

    #[error("unsupported payload version {found} (expected {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },
}

pub type StorageResult<T> = Result<T, StorageError>;
