//! Shared-tier backend with switchable failures.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::backend::{SharedRecord, SharedStore};
use super::error::{SharedStoreError, SharedStoreResult};
use super::memory::MemorySharedStore;

#[derive(Debug, Default)]
struct Switches {
    fail_get: AtomicBool,
    fail_put: AtomicBool,
    fail_remove: AtomicBool,
    gets: AtomicUsize,
    puts: AtomicUsize,
    removes: AtomicUsize,
}

/// Wraps a [`MemorySharedStore`] and fails individual operations on demand.
#[derive(Debug, Clone, Default)]
pub struct FlakySharedStore {
    inner: MemorySharedStore,
    switches: Arc<Switches>,
}

impl FlakySharedStore {
    pub fn new(inner: MemorySharedStore) -> Self {
        Self {
            inner,
            switches: Arc::default(),
        }
    }

    pub fn inner(&self) -> &MemorySharedStore {
        &self.inner
    }

    pub fn fail_get(&self, fail: bool) {
        self.switches.fail_get.store(fail, Ordering::SeqCst);
    }

    pub fn fail_put(&self, fail: bool) {
        self.switches.fail_put.store(fail, Ordering::SeqCst);
    }

    pub fn fail_remove(&self, fail: bool) {
        self.switches.fail_remove.store(fail, Ordering::SeqCst);
    }

    /// Fails every operation.
    pub fn go_down(&self) {
        self.fail_get(true);
        self.fail_put(true);
        self.fail_remove(true);
    }

    pub fn get_calls(&self) -> usize {
        self.switches.gets.load(Ordering::SeqCst)
    }

    pub fn put_calls(&self) -> usize {
        self.switches.puts.load(Ordering::SeqCst)
    }

    pub fn remove_calls(&self) -> usize {
        self.switches.removes.load(Ordering::SeqCst)
    }

    fn outage() -> SharedStoreError {
        SharedStoreError::Unavailable {
            reason: "connection refused".to_string(),
        }
    }
}

impl SharedStore for FlakySharedStore {
    async fn get(&self, key: &str) -> SharedStoreResult<Option<SharedRecord>> {
        self.switches.gets.fetch_add(1, Ordering::SeqCst);
        if self.switches.fail_get.load(Ordering::SeqCst) {
            return Err(Self::outage());
        }
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, blob: Vec<u8>, ttl_secs: u64) -> SharedStoreResult<()> {
        self.switches.puts.fetch_add(1, Ordering::SeqCst);
        if self.switches.fail_put.load(Ordering::SeqCst) {
            return Err(SharedStoreError::Rejected {
                reason: "quota exceeded".to_string(),
            });
        }
        self.inner.put(key, blob, ttl_secs).await
    }

    async fn remove(&self, key: &str) -> SharedStoreResult<()> {
        self.switches.removes.fetch_add(1, Ordering::SeqCst);
        if self.switches.fail_remove.load(Ordering::SeqCst) {
            return Err(Self::outage());
        }
        self.inner.remove(key).await
    }
}
