//! Query interceptor
//!
//! Decides whether a query needs its plan checked and, if so, runs
//! explain + classification and maps the result to continue/abort.
//!
//! Per query:
//!
//! ```text
//! PENDING ──► SHORT_CIRCUIT_PASS
//!    │
//!    └─────► CHECKING ──► PASS
//!                    └──► FAIL
//! ```
//!
//! No retries. A caller that resubmits starts a new query at PENDING.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::errors::{GuardError, GuardErrorKind, GuardResult};
use crate::config::GuardConfig;
use crate::explain::{CapabilityCache, ExplainStore, PlanProvider};
use crate::observability::{log_event, Event, GuardMetrics};
use crate::plan::{classify, ClassificationError};
use crate::query::{ModelDescriptor, ModelIdentity, QueryDescriptor};

/// Guard state of one query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Pending,
    ShortCircuitPass,
    Checking,
    Pass,
    Fail,
}

impl GuardState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuardState::Pending => "PENDING",
            GuardState::ShortCircuitPass => "SHORT_CIRCUIT_PASS",
            GuardState::Checking => "CHECKING",
            GuardState::Pass => "PASS",
            GuardState::Fail => "FAIL",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GuardState::ShortCircuitPass | GuardState::Pass | GuardState::Fail
        )
    }
}

impl fmt::Display for GuardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful guard outcome: the query may run unmodified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Operation, model or configuration is not guarded
    Unguarded,
    /// Trivially indexed; no explain round trip
    ShortCircuitPass,
    /// Winning plan accepted
    Pass,
}

impl GuardOutcome {
    /// Terminal state, if the query entered the state machine
    pub fn state(&self) -> Option<GuardState> {
        match self {
            GuardOutcome::Unguarded => None,
            GuardOutcome::ShortCircuitPass => Some(GuardState::ShortCircuitPass),
            GuardOutcome::Pass => Some(GuardState::Pass),
        }
    }
}

/// Whether a query needs the explain + classify pipeline.
///
/// A query is trivially safe when both hold:
/// - its conditions are empty, or are exactly the primary key
/// - it has no sort, an empty sort, or a single-key sort while the first
///   condition key is the primary key
///
/// The sort rule compares the first *condition* key, not the sort key,
/// against the primary key. A single-key sort on any field therefore passes
/// when the query filters on the primary key alone.
pub fn requires_check(query: &QueryDescriptor, primary_key: &str) -> bool {
    let keys: Vec<&String> = query.conditions.keys().collect();
    let first_key_is_pk = keys.first().is_some_and(|k| k.as_str() == primary_key);

    let sort_trivial = match query.sort() {
        None => true,
        Some(Value::Object(sort)) => sort.is_empty() || (sort.len() == 1 && first_key_is_pk),
        Some(_) => false,
    };
    let conditions_trivial = keys.is_empty() || (keys.len() == 1 && first_key_is_pk);

    !(sort_trivial && conditions_trivial)
}

/// Plan guard for the models registered with it
pub struct PlanGuard {
    config: GuardConfig,
    provider: PlanProvider,
    models: HashMap<ModelIdentity, ModelDescriptor>,
    metrics: Arc<GuardMetrics>,
}

impl PlanGuard {
    pub fn new(store: Arc<dyn ExplainStore>, config: GuardConfig) -> Self {
        Self::with_cache(store, Arc::new(CapabilityCache::new()), config)
    }

    /// Guard sharing an existing capability cache
    pub fn with_cache(
        store: Arc<dyn ExplainStore>,
        cache: Arc<CapabilityCache>,
        config: GuardConfig,
    ) -> Self {
        let provider =
            PlanProvider::with_cache(store, cache).with_prefix(config.explain_model_prefix.clone());
        Self {
            config,
            provider,
            models: HashMap::new(),
            metrics: Arc::new(GuardMetrics::new()),
        }
    }

    /// Registers a model; queries against it are guarded from now on
    pub fn register(&mut self, model: ModelDescriptor) {
        self.models.insert(model.identity.clone(), model);
    }

    /// Builder form of `register`
    pub fn with_model(mut self, model: ModelDescriptor) -> Self {
        self.register(model);
        self
    }

    pub fn model(&self, identity: &ModelIdentity) -> Option<&ModelDescriptor> {
        self.models.get(identity)
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn provider(&self) -> &PlanProvider {
        &self.provider
    }

    pub fn metrics(&self) -> &Arc<GuardMetrics> {
        &self.metrics
    }

    /// Model for `query`, if its operation and model are guarded
    fn guarded_model(&self, query: &QueryDescriptor) -> Option<&ModelDescriptor> {
        if !self.config.guards(query.operation) {
            return None;
        }
        self.models.get(&query.model)
    }

    /// Whether `query` enters the guard state machine at all
    pub fn is_guarded(&self, query: &QueryDescriptor) -> bool {
        self.guarded_model(query).is_some()
    }

    /// Whether `query` goes through explain + classification
    pub fn should_intercept(&self, query: &QueryDescriptor) -> bool {
        self.guarded_model(query).is_some() && requires_check(query, &self.config.primary_key)
    }

    /// Checks `query`'s winning plan. `Ok` means the query may run
    /// unmodified; `Err` aborts this attempt.
    pub async fn guard(&self, query: &QueryDescriptor) -> GuardResult<GuardOutcome> {
        let Some(model) = self.guarded_model(query) else {
            return Ok(GuardOutcome::Unguarded);
        };

        self.metrics.increment_checks();
        let replay = query.replay_hint();

        if !requires_check(query, &self.config.primary_key) {
            self.metrics.increment_short_circuits();
            log_event(
                Event::GuardShortCircuit,
                &[("model", query.model.as_str()), ("operation", query.operation.as_str())],
            );
            return Ok(GuardOutcome::ShortCircuitPass);
        }

        let verdict = match self.provider.winning_plan(model, query).await {
            Ok(plan) => classify(&plan).map_err(GuardErrorKind::from),
            Err(err) => Err(GuardErrorKind::from(err)),
        };

        match verdict {
            Ok(()) => {
                self.metrics.increment_passes();
                log_event(
                    Event::GuardPass,
                    &[("model", query.model.as_str()), ("operation", query.operation.as_str())],
                );
                Ok(GuardOutcome::Pass)
            }
            Err(kind) => {
                let err = GuardError::new(kind, replay);
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    fn record_failure(&self, err: &GuardError) {
        let event = match err.classification() {
            Some(ClassificationError::FullScan { .. }) => {
                self.metrics.increment_full_scan_rejections();
                Event::GuardReject
            }
            Some(ClassificationError::InMemorySort { .. }) => {
                self.metrics.increment_sort_rejections();
                Event::GuardReject
            }
            None => {
                self.metrics.increment_execution_failures();
                Event::GuardExecutionFailed
            }
        };

        let message = err.to_string();
        log_event(
            event,
            &[("code", err.code()), ("message", message.as_str()), ("replay", err.replay())],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explain::MemoryExplainStore;
    use crate::query::{QueryOperation, SchemaDefinition};
    use serde_json::json;

    fn find() -> QueryDescriptor {
        QueryDescriptor::new("m", QueryOperation::Find)
    }

    #[test]
    fn test_empty_query_skips_check() {
        assert!(!requires_check(&find(), "_id"));
    }

    #[test]
    fn test_primary_key_lookup_skips_check() {
        let query = find().with_condition("_id", json!("abc"));
        assert!(!requires_check(&query, "_id"));

        let sorted = query.with_sort(json!({ "_id": 1 }));
        assert!(!requires_check(&sorted, "_id"));
    }

    #[test]
    fn test_empty_or_null_sort_skips_check() {
        assert!(!requires_check(&find().with_sort(json!({})), "_id"));
        assert!(!requires_check(&find().with_sort(Value::Null), "_id"));
    }

    #[test]
    fn test_non_key_filter_requires_check() {
        assert!(requires_check(&find().with_condition("key3", json!("x")), "_id"));
        let two_keys = find()
            .with_condition("_id", json!("a"))
            .with_condition("key1", json!("b"));
        assert!(requires_check(&two_keys, "_id"));
    }

    #[test]
    fn test_sort_without_filter_requires_check() {
        assert!(requires_check(&find().with_sort(json!({ "key3": -1 })), "_id"));
        assert!(requires_check(&find().with_sort(json!({ "_id": 1 })), "_id"));
    }

    #[test]
    fn test_pk_filter_with_single_key_sort_skips_check() {
        let query = find()
            .with_condition("_id", json!("a"))
            .with_sort(json!({ "key3": -1 }));
        assert!(!requires_check(&query, "_id"));

        let multi = find()
            .with_condition("_id", json!("a"))
            .with_sort(json!({ "key2": 1, "key3": 1 }));
        assert!(requires_check(&multi, "_id"));
    }

    #[test]
    fn test_string_sort_requires_check() {
        let query = find().with_sort(json!("-key3"));
        assert!(requires_check(&query, "_id"));
    }

    #[test]
    fn test_custom_primary_key() {
        let query = find().with_condition("uuid", json!("a"));
        assert!(!requires_check(&query, "uuid"));
        assert!(requires_check(&query, "_id"));
    }

    #[test]
    fn test_should_intercept_respects_registration_and_config() {
        let store = Arc::new(MemoryExplainStore::accepting());
        let model = ModelDescriptor::new("m", SchemaDefinition::new(["key3"]));
        let query = find().with_condition("key3", json!("x"));

        let unregistered = PlanGuard::new(store.clone(), GuardConfig::default());
        assert!(!unregistered.should_intercept(&query));

        let guard = PlanGuard::new(store.clone(), GuardConfig::default()).with_model(model.clone());
        assert!(guard.should_intercept(&query));

        let disabled = PlanGuard::new(store, GuardConfig::disabled()).with_model(model);
        assert!(!disabled.should_intercept(&query));
    }

    #[test]
    fn test_state_terminality() {
        assert!(!GuardState::Pending.is_terminal());
        assert!(!GuardState::Checking.is_terminal());
        assert!(GuardState::Fail.is_terminal());
        assert_eq!(GuardOutcome::Pass.state(), Some(GuardState::Pass));
        assert_eq!(GuardOutcome::Unguarded.state(), None);
    }
}
