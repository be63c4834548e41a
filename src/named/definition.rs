use std::collections::BTreeSet;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use super::error::{NamedQueryError, NamedQueryResult};
use super::template::placeholders;
use crate::cache::CacheOptions;

fn default_active() -> bool {
    true
}

/// A stored, parameterized query.
///
/// ```json
/// {
///   "name": "Get_High_Value_Accounts",
///   "parameterizedText": "SELECT Id, Name FROM Account WHERE AnnualRevenue > :minRevenue",
///   "allowedParameterNames": ["minRevenue"],
///   "defaultOptions": { "ttlSeconds": 600 },
///   "active": true,
///   "maxResults": 100
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedQueryDefinition {
    pub name: String,
    pub parameterized_text: String,
    #[serde(default)]
    pub allowed_parameter_names: BTreeSet<String>,
    #[serde(default)]
    pub default_options: CacheOptions,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub max_results: Option<NonZeroUsize>,
}

impl NamedQueryDefinition {
    pub fn new(name: impl Into<String>, parameterized_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameterized_text: parameterized_text.into(),
            allowed_parameter_names: BTreeSet::new(),
            default_options: CacheOptions::default(),
            active: true,
            max_results: None,
        }
    }

    pub fn with_parameters<I, P>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.allowed_parameter_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_options(mut self, options: CacheOptions) -> Self {
        self.default_options = options;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = NonZeroUsize::new(max_results);
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }

    #[inline]
    pub fn allows(&self, parameter: &str) -> bool {
        self.allowed_parameter_names.contains(parameter)
    }

    /// Default options with the definition's row cap applied (the stricter cap wins).
    pub fn effective_options(&self) -> CacheOptions {
        let mut options = self.default_options.clone();
        if let Some(max) = self.max_results {
            options.max_results = Some(options.max_results.map_or(max, |cap| cap.min(max)));
        }
        options
    }

    /// Checks that the template scans cleanly and only references allowed parameters.
    pub fn validate(&self) -> NamedQueryResult<()> {
        if self.name.trim().is_empty() {
            return Err(NamedQueryError::InvalidDefinition {
                name: self.name.clone(),
                reason: "name is empty".to_string(),
            });
        }

        let found = placeholders(&self.parameterized_text).map_err(|e| {
            NamedQueryError::InvalidDefinition {
                name: self.name.clone(),
                reason: e.to_string(),
            }
        })?;

        if let Some(unlisted) = found.iter().find(|p| !self.allows(p.name)) {
            return Err(NamedQueryError::InvalidDefinition {
                name: self.name.clone(),
                reason: format!(
                    "placeholder ':{}' is not an allowed parameter",
                    unlisted.name
                ),
            });
        }

        Ok(())
    }
}
