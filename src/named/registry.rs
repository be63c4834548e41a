use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::definition::NamedQueryDefinition;
use super::error::{NamedQueryError, NamedQueryResult};
use crate::config::Config;

/// Loaded named-query definitions, keyed by name.
///
/// Definitions are validated on insert and immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct NamedQueryRegistry {
    definitions: HashMap<String, Arc<NamedQueryDefinition>>,
}

impl NamedQueryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON array of definitions.
    pub fn from_json(json: &str) -> NamedQueryResult<Self> {
        let definitions: Vec<NamedQueryDefinition> = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for definition in definitions {
            registry.insert(definition)?;
        }
        Ok(registry)
    }

    /// Reads and parses a JSON registry file.
    pub fn from_path(path: &Path) -> NamedQueryResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| NamedQueryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_json(&json)?;
        info!(path = %path.display(), definitions = registry.len(), "Loaded named-query registry");
        Ok(registry)
    }

    /// Loads the registry named by `config.registry_path`, or an empty one.
    pub fn from_config(config: &Config) -> NamedQueryResult<Self> {
        match config.registry_path.as_deref() {
            Some(path) => Self::from_path(path),
            None => Ok(Self::new()),
        }
    }

    /// Adds a definition. Names must be unique.
    pub fn insert(&mut self, definition: NamedQueryDefinition) -> NamedQueryResult<()> {
        definition.validate()?;
        if self.definitions.contains_key(&definition.name) {
            return Err(NamedQueryError::InvalidDefinition {
                name: definition.name,
                reason: "defined more than once".to_string(),
            });
        }
        self.definitions
            .insert(definition.name.clone(), Arc::new(definition));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<NamedQueryDefinition>> {
        self.definitions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }
}
