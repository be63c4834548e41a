//! Cross-cutting, shared constants.
//!
//! Config defaults live here so `config`, `cache` and `canonical` agree on them
//! without importing each other.

/// Default maximum number of entries held by one execution context's scoped tier.
pub const DEFAULT_SCOPED_CAPACITY: usize = 100;

/// Default maximum number of entries held by the in-memory shared tier.
pub const DEFAULT_SHARED_CAPACITY: u64 = 10_000;

/// Default shared-tier time-to-live applied by [`crate::Config::cache_options`].
pub const DEFAULT_TTL_SECS: u64 = 3_600;

/// Maximum sub-select nesting depth the canonicalizer will follow.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 32;

/// Version tag written into every shared-tier envelope.
///
/// Bump when the payload encoding changes; readers treat unknown versions as a miss.
pub const PAYLOAD_FORMAT_VERSION: u16 = 1;

/// Prefix for shared-tier storage keys (`canon:v1:<hex digest>`).
pub const SHARED_KEY_PREFIX: &str = "canon:v1:";
