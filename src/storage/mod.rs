//! Storage primitives: cache entries and the shared-tier blob format.

pub mod error;
mod model;

pub use error::{StorageError, StorageResult};
pub use model::{CacheEntry, SharedEnvelope, decode_rows, encode_rows};
