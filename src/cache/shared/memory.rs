use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::sync::Cache;

use super::backend::{SharedRecord, SharedStore};
use super::error::SharedStoreResult;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::constants::DEFAULT_SHARED_CAPACITY;

/// Upper bound on how long moka keeps an entry around physically.
const MAX_PHYSICAL_TTL_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone)]
struct StoredBlob {
    record: SharedRecord,
    ttl_secs: u64,
}

struct TtlExpiry;

impl TtlExpiry {
    #[inline]
    fn duration(value: &StoredBlob) -> Duration {
        Duration::from_secs(value.ttl_secs.min(MAX_PHYSICAL_TTL_SECS))
    }
}

impl Expiry<String, StoredBlob> for TtlExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredBlob,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(Self::duration(value))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredBlob,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(Self::duration(value))
    }
}

/// In-process shared tier backed by a bounded `moka` cache.
///
/// Clones share the same underlying cache, so one store can back many orchestrators.
/// Entries are evicted physically under capacity pressure or once their TTL elapses;
/// logical expiry is still checked by the reader against its own clock.
#[derive(Clone)]
pub struct MemorySharedStore {
    entries: Cache<String, StoredBlob>,
    clock: Arc<dyn Clock>,
}

impl MemorySharedStore {
    /// Creates a store with the default capacity and the system clock.
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SHARED_CAPACITY)
    }

    /// Creates a store with a max entry capacity.
    #[inline]
    pub fn with_capacity(capacity: u64) -> Self {
        Self::with_clock(capacity, Arc::new(SystemClock))
    }

    /// Creates a store sized by `config.shared_capacity`.
    pub fn from_config(config: &Config) -> Self {
        Self::with_capacity(config.shared_capacity)
    }

    /// Creates a store that stamps `stored_at` from `clock`.
    pub fn with_clock(capacity: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(capacity)
                .expire_after(TtlExpiry)
                .build(),
            clock,
        }
    }

    /// Returns the number of stored blobs.
    #[inline]
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    #[inline]
    pub fn max_capacity(&self) -> Option<u64> {
        self.entries.policy().max_capacity()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.entry_count() == 0
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Runs any pending maintenance tasks in the underlying cache.
    #[inline]
    pub fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }

    /// Replaces the blob stored under `key` without touching its timestamp.
    #[cfg(any(test, feature = "mock"))]
    pub fn overwrite_blob(&self, key: &str, blob: Vec<u8>) {
        if let Some(mut stored) = self.entries.get(key) {
            stored.record.blob = blob;
            self.entries.insert(key.to_string(), stored);
        }
    }
}

impl Default for MemorySharedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemorySharedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySharedStore")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

impl SharedStore for MemorySharedStore {
    async fn get(&self, key: &str) -> SharedStoreResult<Option<SharedRecord>> {
        Ok(self.entries.get(key).map(|stored| stored.record))
    }

    async fn put(&self, key: &str, blob: Vec<u8>, ttl_secs: u64) -> SharedStoreResult<()> {
        let stored = StoredBlob {
            record: SharedRecord {
                blob,
                stored_at: self.clock.now_secs(),
            },
            ttl_secs,
        };
        self.entries.insert(key.to_string(), stored);
        Ok(())
    }

    async fn remove(&self, key: &str) -> SharedStoreResult<()> {
        self.entries.invalidate(key);
        Ok(())
    }
}
