//! Scoped tier: per-context, in-memory, fixed capacity.
//!
//! Owned exclusively by one [`crate::ExecutionContext`], so it needs no locking. Entries
//! never expire individually; the whole tier goes away with its context. Once full, new
//! keys are rejected rather than evicting anything already held.

use std::collections::HashMap;

use super::key::CacheKey;
use crate::constants::DEFAULT_SCOPED_CAPACITY;
use crate::storage::CacheEntry;

/// In-memory exact-match tier keyed by [`CacheKey`].
pub struct ScopedTier {
    entries: HashMap<CacheKey, CacheEntry>,
    capacity: usize,
}

impl ScopedTier {
    /// Creates a tier with the default capacity.
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SCOPED_CAPACITY)
    }

    /// Creates a tier holding at most `capacity` entries.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity.min(DEFAULT_SCOPED_CAPACITY)),
            capacity,
        }
    }

    #[inline]
    pub fn get(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Inserts an entry and returns `true` if it was stored.
    ///
    /// Overwriting a key already present always succeeds; a new key is rejected when
    /// the tier is full.
    #[inline]
    pub fn insert(&mut self, entry: CacheEntry) -> bool {
        if self.is_full() && !self.entries.contains_key(&entry.key) {
            return false;
        }
        self.entries.insert(entry.key, entry);
        true
    }

    #[inline]
    pub fn remove(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.remove(key)
    }

    #[inline]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Returns an iterator of currently stored keys.
    pub fn keys(&self) -> impl Iterator<Item = &CacheKey> {
        self.entries.keys()
    }
}

impl Default for ScopedTier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScopedTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedTier")
            .field("entries", &self.entries.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
