//! Plan provider
//!
//! Resolves the explain capability for a model (building it on first use)
//! and fetches the winning plan for a query.

use std::sync::Arc;

use super::cache::CapabilityCache;
use super::capability::ExplainCapability;
use super::errors::ExecutionResult;
use super::store::ExplainStore;
use crate::plan::PlanNode;
use crate::query::{ModelDescriptor, QueryDescriptor};

/// Default prefix of derived explain model names
pub const DEFAULT_EXPLAIN_PREFIX: &str = "explain_";

/// Fetches winning plans through cached explain capabilities
pub struct PlanProvider {
    store: Arc<dyn ExplainStore>,
    cache: Arc<CapabilityCache>,
    prefix: String,
}

impl PlanProvider {
    pub fn new(store: Arc<dyn ExplainStore>) -> Self {
        Self::with_cache(store, Arc::new(CapabilityCache::new()))
    }

    /// Uses a cache shared with other providers over the same store
    pub fn with_cache(store: Arc<dyn ExplainStore>, cache: Arc<CapabilityCache>) -> Self {
        Self {
            store,
            cache,
            prefix: DEFAULT_EXPLAIN_PREFIX.to_string(),
        }
    }

    /// Sets the derived model name prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn cache(&self) -> &Arc<CapabilityCache> {
        &self.cache
    }

    /// Explain capability for `model`, built at most once per identity
    pub async fn capability(&self, model: &ModelDescriptor) -> ExecutionResult<Arc<ExplainCapability>> {
        self.cache
            .get_or_try_init(&model.identity, || {
                ExplainCapability::build(model, &self.prefix, Arc::clone(&self.store))
            })
            .await
    }

    /// Winning plan for `query` against `model`
    pub async fn winning_plan(
        &self,
        model: &ModelDescriptor,
        query: &QueryDescriptor,
    ) -> ExecutionResult<PlanNode> {
        self.capability(model).await?.explain(query).await
    }
}
