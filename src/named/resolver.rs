use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, instrument};

use super::error::{NamedQueryError, NamedQueryResult};
use super::params::ParamValue;
use super::registry::NamedQueryRegistry;
use super::template::{placeholders, substitute};
use crate::cache::{CacheOptions, SharedStore};
use crate::context::ExecutionContext;
use crate::oracle::QueryOracle;
use crate::orchestrator::{CacheOrchestrator, QueryResult};

/// A named query with its parameters substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundQuery {
    pub name: String,
    /// Query text with every placeholder replaced by an escaped literal.
    pub text: String,
    /// Parameter name to rendered value, as substituted.
    pub bindings: BTreeMap<String, String>,
    pub options: CacheOptions,
}

/// Binds named queries and runs them through a [`CacheOrchestrator`].
pub struct NamedQueryResolver<O: QueryOracle, S: SharedStore> {
    registry: Arc<NamedQueryRegistry>,
    orchestrator: Arc<CacheOrchestrator<O, S>>,
}

impl<O: QueryOracle, S: SharedStore> Clone for NamedQueryResolver<O, S> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            orchestrator: Arc::clone(&self.orchestrator),
        }
    }
}

impl<O: QueryOracle, S: SharedStore> std::fmt::Debug for NamedQueryResolver<O, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedQueryResolver")
            .field("definitions", &self.registry.len())
            .finish()
    }
}

impl<O: QueryOracle, S: SharedStore> NamedQueryResolver<O, S> {
    pub fn new(
        registry: Arc<NamedQueryRegistry>,
        orchestrator: Arc<CacheOrchestrator<O, S>>,
    ) -> Self {
        Self {
            registry,
            orchestrator,
        }
    }

    pub fn registry(&self) -> &NamedQueryRegistry {
        &self.registry
    }

    pub fn orchestrator(&self) -> &Arc<CacheOrchestrator<O, S>> {
        &self.orchestrator
    }

    /// Validates `params` against the definition and substitutes them.
    ///
    /// Checks run in order: definition exists, is active, every supplied name is
    /// allowed, every placeholder has a value.
    #[instrument(skip(self, params), fields(params = params.len()))]
    pub fn resolve(
        &self,
        name: &str,
        params: &BTreeMap<String, ParamValue>,
    ) -> NamedQueryResult<BoundQuery> {
        let definition =
            self.registry
                .get(name)
                .ok_or_else(|| NamedQueryError::UnknownDefinition {
                    name: name.to_string(),
                })?;

        if !definition.active {
            return Err(NamedQueryError::InactiveDefinition {
                name: name.to_string(),
            });
        }

        if let Some(parameter) = params.keys().find(|p| !definition.allows(p)) {
            return Err(NamedQueryError::UnknownParameter {
                name: name.to_string(),
                parameter: parameter.clone(),
            });
        }

        let found = placeholders(&definition.parameterized_text).map_err(|e| {
            NamedQueryError::InvalidDefinition {
                name: name.to_string(),
                reason: e.to_string(),
            }
        })?;

        if let Some(missing) = found.iter().find(|p| !params.contains_key(p.name)) {
            return Err(NamedQueryError::MissingParameter {
                name: name.to_string(),
                parameter: missing.name.to_string(),
            });
        }

        let bindings: BTreeMap<String, String> = params
            .iter()
            .map(|(parameter, value)| (parameter.clone(), value.render()))
            .collect();
        let text = substitute(&definition.parameterized_text, &found, &bindings);
        debug!(bound_len = text.len(), "Named query bound");

        Ok(BoundQuery {
            name: name.to_string(),
            text,
            bindings,
            options: definition.effective_options(),
        })
    }

    /// Resolves `name` and runs it through the cache with the definition's options.
    pub async fn execute(
        &self,
        ctx: &mut ExecutionContext,
        name: &str,
        params: &BTreeMap<String, ParamValue>,
    ) -> NamedQueryResult<QueryResult<O::Record>> {
        let bound = self.resolve(name, params)?;
        let result = self
            .orchestrator
            .query_with_params(ctx, &bound.text, &bound.bindings, &bound.options)
            .await?;
        Ok(result)
    }

    /// Drops the cached result of `name` bound with `params`.
    pub async fn invalidate(
        &self,
        ctx: &mut ExecutionContext,
        name: &str,
        params: &BTreeMap<String, ParamValue>,
    ) -> NamedQueryResult<bool> {
        let bound = self.resolve(name, params)?;
        let removed = self
            .orchestrator
            .invalidate_with_params(
                ctx,
                &bound.text,
                &bound.bindings,
                bound.options.enforce_access_control,
            )
            .await?;
        Ok(removed)
    }
}
