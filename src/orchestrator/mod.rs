//! Read-through query cache: normalize, look up, execute on miss, store.
//!
//! Each call is a single linear pass with no retries. Malformed queries and oracle
//! failures are returned to the caller untouched and never cached; shared-tier problems
//! are absorbed and reported through [`QueryResult::degraded`].
//!
//! Concurrent misses on the same key are not collapsed: each caller runs the oracle and
//! the last shared-tier write wins.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::{QueryError, QueryOutcome};

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::cache::{
    CacheKey, CacheOptions, CacheStatus, DegradedReason, SharedStore, TieredCacheStore,
    TieredLookupResult,
};
use crate::canonical::Canonicalizer;
use crate::clock::Clock;
use crate::config::Config;
use crate::constants::DEFAULT_SCOPED_CAPACITY;
use crate::context::ExecutionContext;
use crate::hashing::hash_bindings;
use crate::oracle::QueryOracle;
use crate::stats::{Outcome, StatsRecorder};

/// Rows returned by [`CacheOrchestrator::query`], tagged with where they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<R> {
    pub rows: Vec<R>,
    pub status: CacheStatus,
    pub key: CacheKey,
    /// Set when a shared-tier problem was absorbed during this call.
    pub degraded: Option<DegradedReason>,
}

impl<R> QueryResult<R> {
    #[inline]
    pub fn is_hit(&self) -> bool {
        self.status.is_hit()
    }

    #[inline]
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn into_rows(self) -> Vec<R> {
        self.rows
    }
}

/// Public entry point tying the canonicalizer, the tiered store, the oracle and the
/// statistics together.
///
/// Holds no per-request state; share it (e.g. in an `Arc`) across contexts.
pub struct CacheOrchestrator<O: QueryOracle, S: SharedStore> {
    canonicalizer: Canonicalizer,
    store: TieredCacheStore<S>,
    oracle: O,
    stats: Arc<StatsRecorder>,
    scoped_capacity: usize,
    default_options: CacheOptions,
}

impl<O: QueryOracle, S: SharedStore> std::fmt::Debug for CacheOrchestrator<O, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheOrchestrator")
            .field("canonicalizer", &self.canonicalizer)
            .field("store", &self.store)
            .field("scoped_capacity", &self.scoped_capacity)
            .field("default_options", &self.default_options)
            .finish()
    }
}

impl<O: QueryOracle, S: SharedStore> CacheOrchestrator<O, S> {
    /// Creates an orchestrator with default limits and the system clock.
    pub fn new(oracle: O, shared: Option<S>) -> Self {
        Self {
            canonicalizer: Canonicalizer::new(),
            store: TieredCacheStore::new(shared),
            oracle,
            stats: Arc::new(StatsRecorder::new()),
            scoped_capacity: DEFAULT_SCOPED_CAPACITY,
            default_options: CacheOptions::default(),
        }
    }

    /// Creates an orchestrator using the limits and default options in `config`.
    pub fn from_config(config: &Config, oracle: O, shared: Option<S>) -> Self {
        Self::new(oracle, shared)
            .with_canonicalizer(Canonicalizer::with_max_depth(config.max_nesting_depth))
            .with_scoped_capacity(config.scoped_capacity)
            .with_default_options(config.cache_options())
    }

    pub fn with_canonicalizer(mut self, canonicalizer: Canonicalizer) -> Self {
        self.canonicalizer = canonicalizer;
        self
    }

    /// Replaces the clock used for shared-tier expiry checks.
    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        let Self {
            canonicalizer,
            store,
            oracle,
            stats,
            scoped_capacity,
            default_options,
        } = self;
        let shared = store.into_shared();
        Self {
            canonicalizer,
            store: TieredCacheStore::with_clock(shared, clock),
            oracle,
            stats,
            scoped_capacity,
            default_options,
        }
    }

    /// Records into an existing recorder (e.g. one shared by several orchestrators).
    pub fn with_stats(mut self, stats: Arc<StatsRecorder>) -> Self {
        self.stats = stats;
        self
    }

    /// Capacity of scoped tiers created by [`Self::open_context`].
    pub fn with_scoped_capacity(mut self, capacity: usize) -> Self {
        self.scoped_capacity = capacity;
        self
    }

    /// Options used by [`Self::query_with_defaults`].
    pub fn with_default_options(mut self, options: CacheOptions) -> Self {
        self.default_options = options;
        self
    }

    /// Opens a fresh execution context sized for this orchestrator.
    pub fn open_context(&self) -> ExecutionContext {
        ExecutionContext::with_capacity(self.scoped_capacity)
    }

    pub fn canonicalizer(&self) -> &Canonicalizer {
        &self.canonicalizer
    }

    pub fn store(&self) -> &TieredCacheStore<S> {
        &self.store
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn stats(&self) -> &Arc<StatsRecorder> {
        &self.stats
    }

    pub fn default_options(&self) -> &CacheOptions {
        &self.default_options
    }

    /// Runs `text` through the cache with this orchestrator's default options.
    pub async fn query_with_defaults(
        &self,
        ctx: &mut ExecutionContext,
        text: &str,
    ) -> QueryOutcome<QueryResult<O::Record>> {
        self.run(ctx, text, None, &self.default_options).await
    }

    /// Runs `text` through the cache.
    pub async fn query(
        &self,
        ctx: &mut ExecutionContext,
        text: &str,
        options: &CacheOptions,
    ) -> QueryOutcome<QueryResult<O::Record>> {
        self.run(ctx, text, None, options).await
    }

    /// Runs `text` through the cache, keyed additionally on `bindings`.
    ///
    /// `bindings` maps parameter names to their rendered values. Two calls sharing
    /// canonical text but not bindings never share a slot.
    pub async fn query_with_params(
        &self,
        ctx: &mut ExecutionContext,
        text: &str,
        bindings: &BTreeMap<String, String>,
        options: &CacheOptions,
    ) -> QueryOutcome<QueryResult<O::Record>> {
        self.run(ctx, text, Some(bindings_digest(bindings)), options)
            .await
    }

    /// Drops the cached result for `text` from `ctx` and, best-effort, the shared tier.
    pub async fn invalidate(
        &self,
        ctx: &mut ExecutionContext,
        text: &str,
        enforce_access_control: bool,
    ) -> QueryOutcome<bool> {
        self.invalidate_key(ctx, text, None, enforce_access_control)
            .await
    }

    /// Like [`Self::invalidate`], for entries stored through [`Self::query_with_params`].
    pub async fn invalidate_with_params(
        &self,
        ctx: &mut ExecutionContext,
        text: &str,
        bindings: &BTreeMap<String, String>,
        enforce_access_control: bool,
    ) -> QueryOutcome<bool> {
        self.invalidate_key(ctx, text, Some(bindings_digest(bindings)), enforce_access_control)
            .await
    }

    async fn invalidate_key(
        &self,
        ctx: &mut ExecutionContext,
        text: &str,
        bindings_hash: Option<u64>,
        enforce_access_control: bool,
    ) -> QueryOutcome<bool> {
        let canonical = self.canonicalizer.normalize(text)?;
        let key = CacheKey::derive(&canonical, bindings_hash, enforce_access_control);
        Ok(self.store.invalidate(ctx.scoped_mut(), &key).await)
    }

    /// Clears `ctx`'s scoped tier.
    pub fn invalidate_all(&self, ctx: &mut ExecutionContext) {
        self.store.invalidate_all(ctx.scoped_mut());
    }

    #[instrument(
        skip(self, ctx, text, options),
        fields(context_id = %ctx.id(), query_len = text.len(), bypass = options.bypass)
    )]
    async fn run(
        &self,
        ctx: &mut ExecutionContext,
        text: &str,
        bindings_hash: Option<u64>,
        options: &CacheOptions,
    ) -> QueryOutcome<QueryResult<O::Record>> {
        let canonical = self.canonicalizer.normalize(text)?;
        let key = CacheKey::derive(&canonical, bindings_hash, options.enforce_access_control);
        debug!(key = %key, "Derived cache key");

        if options.bypass {
            let mut rows = self.execute(text, options).await?;
            options.apply_cap(&mut rows);
            self.stats.record(Outcome::Bypass);
            debug!(rows = rows.len(), "Bypass read complete");
            return Ok(QueryResult {
                rows,
                status: CacheStatus::Bypass,
                key,
                degraded: None,
            });
        }

        let lookup = self
            .store
            .lookup(ctx.scoped_mut(), &key, options.storage_mode)
            .await;
        let status = lookup.status();

        let mut degraded = match lookup {
            TieredLookupResult::HitScoped(entry) | TieredLookupResult::HitShared(entry) => {
                match entry.decode_rows::<O::Record>() {
                    Ok(mut rows) => {
                        options.apply_cap(&mut rows);
                        self.stats.record(Outcome::from(status));
                        info!(status = %status, rows = rows.len(), "Served from cache");
                        return Ok(QueryResult {
                            rows,
                            status,
                            key,
                            degraded: None,
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "Cached rows do not decode; executing query");
                        Some(DegradedReason::CorruptEntry(e.to_string()))
                    }
                }
            }
            TieredLookupResult::Miss { degraded } => degraded,
        };
        if degraded.is_some() {
            self.stats.record_degraded();
        }

        self.stats.record(Outcome::Miss);
        let mut rows = self.execute(text, options).await?;

        // Stored uncapped; the cap belongs to the caller, not the slot.
        let ack = self
            .store
            .store(ctx.scoped_mut(), &key, &rows, options)
            .await;
        if let Some(reason) = ack.degraded() {
            self.stats.record_degraded();
            degraded.get_or_insert_with(|| reason.clone());
        }
        options.apply_cap(&mut rows);

        debug!(rows = rows.len(), degraded = degraded.is_some(), "Cache miss served by oracle");
        Ok(QueryResult {
            rows,
            status: CacheStatus::Miss,
            key,
            degraded,
        })
    }

    async fn execute(&self, text: &str, options: &CacheOptions) -> QueryOutcome<Vec<O::Record>> {
        match self
            .oracle
            .execute(text, options.enforce_access_control)
            .await
        {
            Ok(rows) => Ok(rows),
            Err(e) => {
                self.stats.record_oracle_failure();
                warn!(error = %e, "Oracle call failed");
                Err(e.into())
            }
        }
    }
}

fn bindings_digest(bindings: &BTreeMap<String, String>) -> u64 {
    hash_bindings(
        bindings
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str())),
    )
}
