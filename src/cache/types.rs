use std::num::NonZeroUsize;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_TTL_SECS;

/// Cache tier an entry lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Per-context tier, dropped with its [`crate::ExecutionContext`].
    Scoped,
    /// Cross-context tier with TTL-bounded entries.
    Shared,
}

impl Tier {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Scoped => "scoped",
            Tier::Shared => "shared",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which tiers a call reads from and writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StorageMode {
    ScopedOnly,
    SharedOnly,
    #[default]
    Both,
}

impl StorageMode {
    #[inline]
    pub fn includes_scoped(&self) -> bool {
        matches!(self, StorageMode::ScopedOnly | StorageMode::Both)
    }

    #[inline]
    pub fn includes_shared(&self) -> bool {
        matches!(self, StorageMode::SharedOnly | StorageMode::Both)
    }

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageMode::ScopedOnly => "scoped",
            StorageMode::SharedOnly => "shared",
            StorageMode::Both => "both",
        }
    }
}

impl std::fmt::Display for StorageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a storage mode string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown storage mode '{0}' (expected scoped, shared or both)")]
pub struct ParseStorageModeError(pub String);

impl FromStr for StorageMode {
    type Err = ParseStorageModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scoped" | "scoped_only" | "scopedonly" => Ok(StorageMode::ScopedOnly),
            "shared" | "shared_only" | "sharedonly" => Ok(StorageMode::SharedOnly),
            "both" => Ok(StorageMode::Both),
            _ => Err(ParseStorageModeError(s.to_string())),
        }
    }
}

/// How a query was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CacheStatus {
    HitScoped,
    HitShared,
    Miss,
    /// Cache was skipped entirely for this call.
    Bypass,
}

impl CacheStatus {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::HitScoped => "HIT_SCOPED",
            CacheStatus::HitShared => "HIT_SHARED",
            CacheStatus::Miss => "MISS",
            CacheStatus::Bypass => "BYPASS",
        }
    }

    #[inline]
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheStatus::HitScoped | CacheStatus::HitShared)
    }

    /// Tier that served the hit, if any.
    #[inline]
    pub fn tier(&self) -> Option<Tier> {
        match self {
            CacheStatus::HitScoped => Some(Tier::Scoped),
            CacheStatus::HitShared => Some(Tier::Shared),
            CacheStatus::Miss | CacheStatus::Bypass => None,
        }
    }
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call caching options.
///
/// Deserializes from camelCase JSON (as found in named-query definitions); missing
/// fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheOptions {
    /// Tiers to consult and populate. Default: [`StorageMode::Both`].
    pub storage_mode: StorageMode,

    /// Shared-tier time-to-live. `0` disables the shared write. Default: `3600`.
    #[serde(rename = "ttlSeconds")]
    pub ttl_secs: u64,

    /// Row cap applied to the rows returned; cached rows are kept whole.
    pub max_results: Option<NonZeroUsize>,

    /// Forwarded to the oracle; also part of the cache key.
    pub enforce_access_control: bool,

    /// Skip every tier for this call.
    pub bypass: bool,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            storage_mode: StorageMode::Both,
            ttl_secs: DEFAULT_TTL_SECS,
            max_results: None,
            enforce_access_control: false,
            bypass: false,
        }
    }
}

impl CacheOptions {
    /// Options for a live read that neither reads nor writes any tier.
    pub fn bypassed() -> Self {
        Self {
            bypass: true,
            ..Self::default()
        }
    }

    pub fn with_storage_mode(mut self, storage_mode: StorageMode) -> Self {
        self.storage_mode = storage_mode;
        self
    }

    pub fn with_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    /// Sets the row cap; `0` removes it.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = NonZeroUsize::new(max_results);
        self
    }

    pub fn with_access_control(mut self, enforce: bool) -> Self {
        self.enforce_access_control = enforce;
        self
    }

    pub fn with_bypass(mut self, bypass: bool) -> Self {
        self.bypass = bypass;
        self
    }

    /// Truncates `rows` to `max_results`, if set.
    #[inline]
    pub fn apply_cap<R>(&self, rows: &mut Vec<R>) {
        if let Some(max) = self.max_results {
            rows.truncate(max.get());
        }
    }
}
