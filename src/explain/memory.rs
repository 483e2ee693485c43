//! In-memory explain store
//!
//! Plans queries against the indexes of the schemas registered with it,
//! the way a document store's planner would for simple equality filters
//! and sorts. Counts registrations and explain calls so tests can observe
//! how often the guard reaches the store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use serde_json::{json, Map, Value};

use super::errors::{ExecutionError, ExecutionResult};
use super::store::{ExplainStore, StoreFuture};
use crate::query::SchemaDefinition;

/// Scripted planner: (schema, conditions, options) -> explain records
pub type Planner = Arc<
    dyn Fn(&SchemaDefinition, &Map<String, Value>, &Map<String, Value>) -> ExecutionResult<Vec<Value>>
        + Send
        + Sync,
>;

/// Explain store backed by registered schemas
pub struct MemoryExplainStore {
    models: RwLock<HashMap<String, SchemaDefinition>>,
    planner: Planner,
    registrations: AtomicUsize,
    explain_calls: AtomicUsize,
    last_options: RwLock<Option<Map<String, Value>>>,
}

impl MemoryExplainStore {
    /// Store that plans from the registered schema's indexes
    pub fn new() -> Self {
        Self::with_planner(|schema, conditions, options| {
            Ok(vec![json!({
                "queryPlanner": { "winningPlan": plan_query(schema, conditions, options) }
            })])
        })
    }

    /// Store that answers every explain with `planner`
    pub fn with_planner<F>(planner: F) -> Self
    where
        F: Fn(&SchemaDefinition, &Map<String, Value>, &Map<String, Value>) -> ExecutionResult<Vec<Value>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            models: RwLock::new(HashMap::new()),
            planner: Arc::new(planner),
            registrations: AtomicUsize::new(0),
            explain_calls: AtomicUsize::new(0),
            last_options: RwLock::new(None),
        }
    }

    /// Store whose winning plan is always `plan`
    pub fn with_plan(plan: Value) -> Self {
        Self::with_planner(move |_, _, _| Ok(vec![json!({ "queryPlanner": { "winningPlan": plan } })]))
    }

    /// Store whose winning plan is always an index scan
    pub fn accepting() -> Self {
        Self::with_plan(json!({
            "stage": "FETCH",
            "inputStage": { "stage": "IXSCAN", "indexName": "_id_" }
        }))
    }

    /// Store whose explain always fails with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::with_planner(move |_, _, _| Err(ExecutionError::store(message.clone())))
    }

    /// Number of successful model registrations
    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }

    /// Number of explain round trips
    pub fn explain_calls(&self) -> usize {
        self.explain_calls.load(Ordering::SeqCst)
    }

    /// Registered model names, sorted
    pub fn registered_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .models
            .read()
            .map(|models| models.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Schema registered under `name`
    pub fn schema(&self, name: &str) -> Option<SchemaDefinition> {
        self.models.read().ok()?.get(name).cloned()
    }

    /// Options passed to the most recent explain
    pub fn last_options(&self) -> Option<Map<String, Value>> {
        self.last_options.read().ok()?.clone()
    }
}

impl Default for MemoryExplainStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ExplainStore for MemoryExplainStore {
    fn has_model<'a>(&'a self, name: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            let models = self
                .models
                .read()
                .map_err(|_| ExecutionError::store("model registry poisoned"))?;
            Ok(models.contains_key(name))
        })
    }

    fn register_model<'a>(
        &'a self,
        name: &'a str,
        schema: &'a SchemaDefinition,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut models = self
                .models
                .write()
                .map_err(|_| ExecutionError::registration(name, "model registry poisoned"))?;
            if models.contains_key(name) {
                return Err(ExecutionError::registration(
                    name,
                    "cannot overwrite model once compiled",
                ));
            }
            models.insert(name.to_string(), schema.clone());
            self.registrations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn explain_find<'a>(
        &'a self,
        model: &'a str,
        conditions: &'a Map<String, Value>,
        options: &'a Map<String, Value>,
    ) -> StoreFuture<'a, Vec<Value>> {
        Box::pin(async move {
            self.explain_calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut last) = self.last_options.write() {
                *last = Some(options.clone());
            }

            let schema = self
                .schema(model)
                .ok_or_else(|| ExecutionError::store(format!("Schema hasn't been registered for model \"{}\"", model)))?;

            (self.planner)(&schema, conditions, options)
        })
    }
}

/// Index name in the store's naming convention, e.g. `key2_1_key3_1`
fn index_name(keys: &[(String, i32)]) -> String {
    keys.iter()
        .map(|(k, d)| format!("{}_{}", k, d))
        .collect::<Vec<_>>()
        .join("_")
}

/// Picks a winning plan for equality filters and an optional sort.
///
/// An index is usable for the filter when its first key is filtered on. A
/// sort is covered when its keys continue the chosen index after the
/// filtered prefix, or when nothing is filtered and the sort keys are an
/// index prefix. Anything else needs a collection scan or an in-memory
/// sort.
pub fn plan_query(
    schema: &SchemaDefinition,
    conditions: &Map<String, Value>,
    options: &Map<String, Value>,
) -> Value {
    let mut indexes: Vec<Vec<(String, i32)>> = vec![vec![("_id".to_string(), 1)]];
    indexes.extend(schema.indexes.iter().map(|i| i.keys.clone()));

    let sort_keys: Vec<String> = options
        .get("sort")
        .and_then(Value::as_object)
        .map(|s| s.keys().cloned().collect())
        .unwrap_or_default();

    let filtered_prefix = |keys: &[(String, i32)]| {
        keys.iter()
            .take_while(|(k, _)| conditions.contains_key(k))
            .count()
    };
    let covers_sort = |keys: &[(String, i32)], prefix: usize| {
        !sort_keys.is_empty()
            && keys.len() >= prefix + sort_keys.len()
            && keys[prefix..prefix + sort_keys.len()]
                .iter()
                .zip(&sort_keys)
                .all(|((k, _), s)| k == s)
    };

    let chosen = if conditions.is_empty() {
        indexes.iter().find(|keys| covers_sort(keys, 0))
    } else {
        indexes
            .iter()
            .filter(|keys| filtered_prefix(keys) > 0)
            .max_by_key(|keys| (filtered_prefix(keys), covers_sort(keys, filtered_prefix(keys))))
    };

    let (access, sort_covered) = match chosen {
        Some(keys) => {
            let prefix = filtered_prefix(keys);
            let key_pattern: Map<String, Value> =
                keys.iter().map(|(k, d)| (k.clone(), json!(d))).collect();
            let ixscan = json!({
                "stage": "IXSCAN",
                "keyPattern": key_pattern,
                "indexName": index_name(keys),
            });
            (json!({ "stage": "FETCH", "inputStage": ixscan }), covers_sort(keys, prefix))
        }
        None => (
            json!({ "stage": "COLLSCAN", "filter": conditions, "direction": "forward" }),
            false,
        ),
    };

    match options.get("sort") {
        Some(sort) if !sort_keys.is_empty() && !sort_covered => json!({
            "stage": "SORT",
            "sortPattern": sort,
            "inputStage": access,
        }),
        _ => access,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::IndexSpec;

    fn schema() -> SchemaDefinition {
        SchemaDefinition::new(["key1", "key2", "key3"])
            .with_index(IndexSpec::new([("key1", 1)]).unique())
            .with_index(IndexSpec::new([("key2", 1), ("key3", 1)]))
    }

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_plan_indexed_equality() {
        let plan = plan_query(&schema(), &obj(json!({ "key1": "x" })), &Map::new());
        assert_eq!(plan["stage"], "FETCH");
        assert_eq!(plan["inputStage"]["indexName"], "key1_1");
    }

    #[test]
    fn test_plan_unindexed_filter_scans() {
        let plan = plan_query(&schema(), &obj(json!({ "key3": "test" })), &Map::new());
        assert_eq!(plan["stage"], "COLLSCAN");
        assert_eq!(plan["filter"], json!({ "key3": "test" }));
    }

    #[test]
    fn test_plan_unindexed_sort_sorts_in_memory() {
        let plan = plan_query(&schema(), &Map::new(), &obj(json!({ "sort": { "key3": -1 } })));
        assert_eq!(plan["stage"], "SORT");
        assert_eq!(plan["sortPattern"], json!({ "key3": -1 }));
        assert_eq!(plan["inputStage"]["stage"], "COLLSCAN");
    }

    #[test]
    fn test_plan_sort_covered_by_compound_index() {
        let plan = plan_query(
            &schema(),
            &obj(json!({ "key2": "a" })),
            &obj(json!({ "sort": { "key3": 1 } })),
        );
        assert_eq!(plan["stage"], "FETCH");
        assert_eq!(plan["inputStage"]["indexName"], "key2_1_key3_1");
    }

    #[test]
    fn test_plan_reversed_sort_not_covered() {
        let plan = plan_query(&schema(), &Map::new(), &obj(json!({ "sort": { "key3": 1, "key2": 1 } })));
        assert_eq!(plan["stage"], "SORT");
        assert_eq!(plan["sortPattern"], json!({ "key3": 1, "key2": 1 }));

        let plan = plan_query(&schema(), &Map::new(), &obj(json!({ "sort": { "key2": 1, "key3": 1 } })));
        assert_eq!(plan["stage"], "FETCH");
    }

    #[tokio::test]
    async fn test_has_model_after_registration() {
        let store = MemoryExplainStore::new();
        assert!(!store.has_model("explain_m").await.unwrap());
        store.register_model("explain_m", &schema()).await.unwrap();
        assert!(store.has_model("explain_m").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected() {
        let store = MemoryExplainStore::new();
        store.register_model("explain_m", &schema()).await.unwrap();
        let err = store.register_model("explain_m", &schema()).await.unwrap_err();
        assert!(matches!(err, ExecutionError::Registration { .. }));
        assert_eq!(store.registrations(), 1);
    }

    #[tokio::test]
    async fn test_explain_unknown_model_fails() {
        let store = MemoryExplainStore::new();
        let err = store
            .explain_find("explain_missing", &Map::new(), &Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Store(_)));
        assert_eq!(store.explain_calls(), 1);
    }
}
