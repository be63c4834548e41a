//! Scoped and shared cache tiers and the store that coordinates them.

pub mod key;
pub mod scoped;
pub mod shared;
pub mod tiered;
pub mod types;

#[cfg(test)]
mod scoped_tests;

pub use key::CacheKey;
pub use scoped::ScopedTier;
#[cfg(any(test, feature = "mock"))]
pub use shared::FlakySharedStore;
pub use shared::{
    MemorySharedStore, SharedRecord, SharedStore, SharedStoreError, SharedStoreResult,
};
pub use tiered::{DegradedReason, StoreAck, TieredCacheStore, TieredLookupResult};
pub use types::{CacheOptions, CacheStatus, ParseStorageModeError, StorageMode, Tier};
