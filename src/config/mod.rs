//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `CANON_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::PathBuf;

use crate::cache::{CacheOptions, StorageMode};
use crate::constants::{
    DEFAULT_MAX_NESTING_DEPTH, DEFAULT_SCOPED_CAPACITY, DEFAULT_SHARED_CAPACITY, DEFAULT_TTL_SECS,
};

/// Cache configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `CANON_*` overrides on top of defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Max entries per execution context's scoped tier. Default: `100`.
    pub scoped_capacity: usize,

    /// Max entries in the in-process shared tier. Default: `10_000`.
    pub shared_capacity: u64,

    /// Shared-tier TTL used when a call does not set one. Default: `3600`.
    pub default_ttl_secs: u64,

    /// Tiers used when a call does not choose. Default: `both`.
    pub storage_mode: StorageMode,

    /// Deepest sub-select nesting accepted by the canonicalizer. Default: `32`.
    pub max_nesting_depth: usize,

    /// JSON file of named-query definitions.
    pub registry_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scoped_capacity: DEFAULT_SCOPED_CAPACITY,
            shared_capacity: DEFAULT_SHARED_CAPACITY,
            default_ttl_secs: DEFAULT_TTL_SECS,
            storage_mode: StorageMode::Both,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            registry_path: None,
        }
    }
}

impl Config {
    const ENV_SCOPED_CAPACITY: &'static str = "CANON_SCOPED_CAPACITY";
    const ENV_SHARED_CAPACITY: &'static str = "CANON_SHARED_CAPACITY";
    const ENV_DEFAULT_TTL_SECS: &'static str = "CANON_DEFAULT_TTL_SECS";
    const ENV_STORAGE_MODE: &'static str = "CANON_STORAGE_MODE";
    const ENV_MAX_NESTING_DEPTH: &'static str = "CANON_MAX_NESTING_DEPTH";
    const ENV_REGISTRY_PATH: &'static str = "CANON_REGISTRY_PATH";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let scoped_capacity =
            Self::parse_number_from_env(Self::ENV_SCOPED_CAPACITY, defaults.scoped_capacity)?;
        let shared_capacity =
            Self::parse_number_from_env(Self::ENV_SHARED_CAPACITY, defaults.shared_capacity)?;
        let default_ttl_secs =
            Self::parse_number_from_env(Self::ENV_DEFAULT_TTL_SECS, defaults.default_ttl_secs)?;
        let storage_mode = Self::parse_storage_mode_from_env(defaults.storage_mode)?;
        let max_nesting_depth =
            Self::parse_number_from_env(Self::ENV_MAX_NESTING_DEPTH, defaults.max_nesting_depth)?;
        let registry_path = Self::parse_optional_path_from_env(Self::ENV_REGISTRY_PATH);

        Ok(Self {
            scoped_capacity,
            shared_capacity,
            default_ttl_secs,
            storage_mode,
            max_nesting_depth,
            registry_path,
        })
    }

    /// Validates limits and paths (does not read the registry).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shared_capacity == 0 {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_SHARED_CAPACITY,
                value: self.shared_capacity.to_string(),
                reason: "must be at least 1",
            });
        }

        if self.max_nesting_depth == 0 {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_MAX_NESTING_DEPTH,
                value: self.max_nesting_depth.to_string(),
                reason: "must be at least 1",
            });
        }

        if let Some(ref path) = self.registry_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        Ok(())
    }

    /// Options applied to calls that do not bring their own.
    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions::default()
            .with_storage_mode(self.storage_mode)
            .with_ttl_secs(self.default_ttl_secs)
    }

    fn parse_number_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr<Err = std::num::ParseIntError>,
    {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e| ConfigError::InvalidNumber {
                    name: var_name,
                    value,
                    source: e,
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_storage_mode_from_env(default: StorageMode) -> Result<StorageMode, ConfigError> {
        match env::var(Self::ENV_STORAGE_MODE) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidStorageMode { source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }
}
