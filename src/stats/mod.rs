//! Cache statistics: lock-free counters shared across contexts.


use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::cache::{CacheStatus, Tier};

/// What happened to one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Hit(Tier),
    Miss,
    /// Live read that skipped the cache. Counted as a miss.
    Bypass,
}

impl From<CacheStatus> for Outcome {
    fn from(status: CacheStatus) -> Self {
        match status {
            CacheStatus::HitScoped => Outcome::Hit(Tier::Scoped),
            CacheStatus::HitShared => Outcome::Hit(Tier::Shared),
            CacheStatus::Miss => Outcome::Miss,
            CacheStatus::Bypass => Outcome::Bypass,
        }
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub total_queries: u64,
    pub hits: u64,
    pub misses: u64,
    pub hits_scoped: u64,
    pub hits_shared: u64,
    pub bypassed: u64,
    pub degraded: u64,
    pub oracle_failures: u64,
    /// `hits / total_queries * 100`, or `0.0` before the first query.
    pub hit_rate_percent: f64,
}

impl StatsSnapshot {
    /// Hits served by `tier`.
    pub fn hits_for(&self, tier: Tier) -> u64 {
        match tier {
            Tier::Scoped => self.hits_scoped,
            Tier::Shared => self.hits_shared,
        }
    }
}

/// Query counters. Every method is safe to call concurrently.
#[derive(Debug, Default)]
pub struct StatsRecorder {
    total_queries: AtomicU64,
    hits_scoped: AtomicU64,
    hits_shared: AtomicU64,
    misses: AtomicU64,
    bypassed: AtomicU64,
    degraded: AtomicU64,
    oracle_failures: AtomicU64,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: Outcome) {
        self.total_queries.fetch_add(1, Ordering::Relaxed);
        match outcome {
            Outcome::Hit(Tier::Scoped) => {
                self.hits_scoped.fetch_add(1, Ordering::Relaxed);
            }
            Outcome::Hit(Tier::Shared) => {
                self.hits_shared.fetch_add(1, Ordering::Relaxed);
            }
            Outcome::Miss => {
                self.misses.fetch_add(1, Ordering::Relaxed);
            }
            Outcome::Bypass => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                self.bypassed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Counts a shared-tier problem that was absorbed.
    pub fn record_degraded(&self) {
        self.degraded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_oracle_failure(&self) {
        self.oracle_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Counters are read individually, so a snapshot taken under concurrent updates may
    /// be off by the in-flight calls.
    pub fn snapshot(&self) -> StatsSnapshot {
        let total_queries = self.total_queries.load(Ordering::Relaxed);
        let hits_scoped = self.hits_scoped.load(Ordering::Relaxed);
        let hits_shared = self.hits_shared.load(Ordering::Relaxed);
        let hits = hits_scoped + hits_shared;

        let hit_rate_percent = if total_queries == 0 {
            0.0
        } else {
            hits as f64 / total_queries as f64 * 100.0
        };

        StatsSnapshot {
            total_queries,
            hits,
            misses: self.misses.load(Ordering::Relaxed),
            hits_scoped,
            hits_shared,
            bypassed: self.bypassed.load(Ordering::Relaxed),
            degraded: self.degraded.load(Ordering::Relaxed),
            oracle_failures: self.oracle_failures.load(Ordering::Relaxed),
            hit_rate_percent,
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.total_queries,
            &self.hits_scoped,
            &self.hits_shared,
            &self.misses,
            &self.bypassed,
            &self.degraded,
            &self.oracle_failures,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
