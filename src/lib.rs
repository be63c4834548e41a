//! Canon library crate: query canonicalization and a tiered read-through cache.
//!
//! # Overview
//!
//! - [`canonical`] turns raw query text into a deterministic [`CanonicalKey`], so
//!   queries that differ only in whitespace, keyword case, selection order or conjunct
//!   order share one cache slot.
//! - [`cache`] holds the per-context [`ScopedTier`], the [`SharedStore`] trait with the
//!   in-process [`MemorySharedStore`], and the [`TieredCacheStore`] coordinating them.
//! - [`orchestrator`] is the entry point: [`CacheOrchestrator::query`] normalizes,
//!   looks up, calls the [`QueryOracle`] on a miss and stores the result.
//! - [`named`] binds stored parameterized queries and runs them through the
//!   orchestrator.
//! - [`stats`] counts hits, misses and absorbed failures.
//!
//! ## Test/Mock Support
//! [`MockOracle`] and [`FlakySharedStore`] are available behind
//! `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod canonical;
pub mod clock;
pub mod config;
pub mod constants;
pub mod context;
pub mod hashing;
pub mod named;
pub mod oracle;
pub mod orchestrator;
pub mod stats;
pub mod storage;

#[cfg(any(test, feature = "mock"))]
pub use cache::FlakySharedStore;
pub use cache::{
    CacheKey, CacheOptions, CacheStatus, DegradedReason, MemorySharedStore, ScopedTier,
    SharedRecord, SharedStore, SharedStoreError, StorageMode, StoreAck, Tier, TieredCacheStore,
    TieredLookupResult,
};
pub use canonical::{
    CanonicalError, CanonicalKey, Canonicalizer, NormalizationPath, normalize, prescan,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, ConfigError};
pub use context::ExecutionContext;
pub use hashing::{hash_bindings, hash_cache_key, hash_canonical};
pub use named::{
    BoundQuery, NamedQueryDefinition, NamedQueryError, NamedQueryRegistry, NamedQueryResolver,
    ParamValue,
};
#[cfg(any(test, feature = "mock"))]
pub use oracle::MockOracle;
pub use oracle::{JsonRecord, OracleError, QueryOracle};
pub use orchestrator::{CacheOrchestrator, QueryError, QueryResult};
pub use stats::{Outcome, StatsRecorder, StatsSnapshot};
pub use storage::{CacheEntry, SharedEnvelope, StorageError};
