//! Tiered cache store: scoped tier, then shared tier.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::key::CacheKey;
use super::scoped::ScopedTier;
use super::shared::SharedStore;
use super::types::{CacheOptions, CacheStatus, StorageMode, Tier};
use crate::clock::{Clock, SystemClock};
use crate::storage::{CacheEntry, SharedEnvelope, StorageError, encode_rows};

/// Why a shared-tier operation did not take effect.
///
/// Never raised to callers; reported alongside the result and counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradedReason {
    /// The shared tier failed a read.
    SharedRead(String),
    /// The shared tier failed a write.
    SharedWrite(String),
    /// Rows could not be serialized for caching.
    Encode(String),
    /// A cached entry could not be decoded.
    CorruptEntry(String),
}

impl std::fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DegradedReason::SharedRead(reason) => write!(f, "shared read failed: {}", reason),
            DegradedReason::SharedWrite(reason) => write!(f, "shared write failed: {}", reason),
            DegradedReason::Encode(reason) => write!(f, "encode failed: {}", reason),
            DegradedReason::CorruptEntry(reason) => write!(f, "corrupt entry: {}", reason),
        }
    }
}

#[derive(Debug)]
pub enum TieredLookupResult {
    HitScoped(CacheEntry),
    HitShared(CacheEntry),
    /// Nothing usable was found. `degraded` is set when the shared tier failed.
    Miss { degraded: Option<DegradedReason> },
}

impl TieredLookupResult {
    #[inline]
    fn miss() -> Self {
        TieredLookupResult::Miss { degraded: None }
    }

    pub fn status(&self) -> CacheStatus {
        match self {
            TieredLookupResult::HitScoped(_) => CacheStatus::HitScoped,
            TieredLookupResult::HitShared(_) => CacheStatus::HitShared,
            TieredLookupResult::Miss { .. } => CacheStatus::Miss,
        }
    }

    pub fn is_hit(&self) -> bool {
        !matches!(self, TieredLookupResult::Miss { .. })
    }

    pub fn is_scoped_hit(&self) -> bool {
        matches!(self, TieredLookupResult::HitScoped(_))
    }

    pub fn is_shared_hit(&self) -> bool {
        matches!(self, TieredLookupResult::HitShared(_))
    }

    pub fn entry(&self) -> Option<&CacheEntry> {
        match self {
            TieredLookupResult::HitScoped(entry) | TieredLookupResult::HitShared(entry) => {
                Some(entry)
            }
            TieredLookupResult::Miss { .. } => None,
        }
    }
}

/// Outcome of [`TieredCacheStore::store`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreAck {
    /// Every requested tier accepted the write, or declined it by policy.
    Stored,
    /// `bypass` was set; no tier was touched.
    Skipped,
    /// At least one shared-tier step failed; whatever else could be written was.
    Degraded(DegradedReason),
}

impl StoreAck {
    pub fn degraded(&self) -> Option<&DegradedReason> {
        match self {
            StoreAck::Degraded(reason) => Some(reason),
            StoreAck::Stored | StoreAck::Skipped => None,
        }
    }
}

/// Coordinates the caller's scoped tier with an optional shared tier.
///
/// The store itself holds only the shared backend and a clock; the scoped tier is
/// passed in per call because it belongs to the caller's execution context. Without
/// a shared backend every shared step behaves as if the tier were empty.
pub struct TieredCacheStore<S: SharedStore> {
    shared: Option<S>,
    clock: Arc<dyn Clock>,
}

impl<S: SharedStore> std::fmt::Debug for TieredCacheStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredCacheStore")
            .field("shared", &self.shared.is_some())
            .field("clock", &self.clock)
            .finish()
    }
}

impl<S: SharedStore> TieredCacheStore<S> {
    pub fn new(shared: Option<S>) -> Self {
        Self::with_clock(shared, Arc::new(SystemClock))
    }

    pub fn with_clock(shared: Option<S>, clock: Arc<dyn Clock>) -> Self {
        Self { shared, clock }
    }

    pub fn shared(&self) -> Option<&S> {
        self.shared.as_ref()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn into_shared(self) -> Option<S> {
        self.shared
    }

    #[instrument(skip(self, scoped), fields(key = %key, mode = %mode))]
    pub async fn lookup(
        &self,
        scoped: &mut ScopedTier,
        key: &CacheKey,
        mode: StorageMode,
    ) -> TieredLookupResult {
        if mode.includes_scoped() {
            debug!("Checking scoped tier");
            if let Some(entry) = scoped.get(key) {
                info!("Scoped tier hit");
                return TieredLookupResult::HitScoped(entry.clone());
            }
        }

        if !mode.includes_shared() {
            return TieredLookupResult::miss();
        }
        let Some(shared) = self.shared.as_ref() else {
            debug!("No shared tier configured");
            return TieredLookupResult::miss();
        };

        debug!("Checking shared tier");
        let record = match shared.get(&key.storage_key()).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!("Shared tier miss");
                return TieredLookupResult::miss();
            }
            Err(e) => {
                warn!(error = %e, "Shared tier read failed; treating as miss");
                return TieredLookupResult::Miss {
                    degraded: Some(DegradedReason::SharedRead(e.to_string())),
                };
            }
        };

        let envelope = match SharedEnvelope::decode(&record.blob) {
            Ok(envelope) => envelope,
            Err(StorageError::UnsupportedVersion { found, expected }) => {
                debug!(found, expected, "Shared entry written by another format version");
                return TieredLookupResult::miss();
            }
            Err(e) => {
                warn!(error = %e, "Shared entry is unreadable; treating as miss");
                return TieredLookupResult::Miss {
                    degraded: Some(DegradedReason::CorruptEntry(e.to_string())),
                };
            }
        };

        let entry = CacheEntry {
            key: *key,
            payload: envelope.payload,
            row_count: envelope.row_count as usize,
            stored_at: record.stored_at,
            ttl_secs: envelope.ttl_secs,
            source_tier: Tier::Shared,
        };

        let now = self.clock.now_secs();
        if entry.is_expired_at(now) {
            debug!(
                stored_at = entry.stored_at,
                ttl_secs = entry.ttl_secs,
                now,
                "Shared entry expired"
            );
            return TieredLookupResult::miss();
        }

        if mode.includes_scoped() {
            let promoted = scoped.insert(CacheEntry {
                source_tier: Tier::Scoped,
                ..entry.clone()
            });
            debug!(promoted, "Promoting shared hit into scoped tier");
        }

        info!(age_secs = now - entry.stored_at, "Shared tier hit");
        TieredLookupResult::HitShared(entry)
    }

    /// Writes `rows` to every tier named by `options.storage_mode`.
    ///
    /// Tiers are written independently. A full scoped tier rejects new keys silently;
    /// shared-tier problems come back as [`StoreAck::Degraded`].
    #[instrument(skip(self, scoped, rows, options), fields(key = %key, rows = rows.len(), mode = %options.storage_mode))]
    pub async fn store<R: Serialize>(
        &self,
        scoped: &mut ScopedTier,
        key: &CacheKey,
        rows: &[R],
        options: &CacheOptions,
    ) -> StoreAck {
        if options.bypass {
            debug!("Bypass set; not storing");
            return StoreAck::Skipped;
        }

        let payload = match encode_rows(rows) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Failed to encode rows for caching");
                return StoreAck::Degraded(DegradedReason::Encode(e.to_string()));
            }
        };

        let mode = options.storage_mode;
        let now = self.clock.now_secs();

        if mode.includes_scoped() {
            let stored = scoped.insert(CacheEntry {
                key: *key,
                payload: payload.clone(),
                row_count: rows.len(),
                stored_at: now,
                ttl_secs: options.ttl_secs,
                source_tier: Tier::Scoped,
            });
            if stored {
                debug!("Stored in scoped tier");
            } else {
                debug!(
                    capacity = scoped.capacity(),
                    "Scoped tier full; entry rejected"
                );
            }
        }

        if !mode.includes_shared() {
            return StoreAck::Stored;
        }
        if options.ttl_secs == 0 {
            debug!("TTL is zero; skipping shared tier");
            return StoreAck::Stored;
        }
        let Some(shared) = self.shared.as_ref() else {
            return StoreAck::Stored;
        };

        let envelope = SharedEnvelope::new(options.ttl_secs, rows.len() as u64, payload);
        let blob = match envelope.encode() {
            Ok(blob) => blob,
            Err(e) => {
                warn!(error = %e, "Failed to encode shared envelope");
                return StoreAck::Degraded(DegradedReason::Encode(e.to_string()));
            }
        };

        match shared.put(&key.storage_key(), blob, options.ttl_secs).await {
            Ok(()) => {
                debug!(ttl_secs = options.ttl_secs, "Stored in shared tier");
                StoreAck::Stored
            }
            Err(e) => {
                warn!(error = %e, "Shared tier write failed; entry kept scoped only");
                StoreAck::Degraded(DegradedReason::SharedWrite(e.to_string()))
            }
        }
    }

    /// Removes `key` from the scoped tier and, best-effort, from the shared tier.
    ///
    /// Returns `true` if the scoped tier held the key.
    #[instrument(skip(self, scoped), fields(key = %key))]
    pub async fn invalidate(&self, scoped: &mut ScopedTier, key: &CacheKey) -> bool {
        let removed = scoped.remove(key).is_some();

        if let Some(shared) = self.shared.as_ref()
            && let Err(e) = shared.remove(&key.storage_key()).await
        {
            warn!(error = %e, "Shared tier remove failed; entry will live until its TTL");
        }

        removed
    }

    /// Clears the scoped tier. The shared tier has no global invalidation.
    pub fn invalidate_all(&self, scoped: &mut ScopedTier) {
        debug!(entries = scoped.len(), "Clearing scoped tier");
        scoped.clear();
    }
}
