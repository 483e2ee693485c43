//! Explain-capability cache
//!
//! One slot per model identity. Each slot is a `OnceCell`, so concurrent
//! first accesses await the same initializer and the store sees exactly one
//! registration per identity. A failed initializer leaves the slot empty;
//! the next query against that model tries again.
//!
//! Only capabilities are cached. Plan verdicts never are.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;

use super::capability::ExplainCapability;
use super::errors::{ExecutionError, ExecutionResult};
use crate::query::ModelIdentity;

type Slot = Arc<OnceCell<Arc<ExplainCapability>>>;

/// Keyed get-or-create cache of explain capabilities
#[derive(Debug, Default)]
pub struct CapabilityCache {
    slots: Mutex<HashMap<ModelIdentity, Slot>>,
    constructions: AtomicU64,
}

impl CapabilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached capability for `identity`, running `init` if none
    /// has been built yet. `init` runs at most once per successful build.
    pub async fn get_or_try_init<F, Fut>(
        &self,
        identity: &ModelIdentity,
        init: F,
    ) -> ExecutionResult<Arc<ExplainCapability>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ExecutionResult<ExplainCapability>>,
    {
        let slot = self.slot(identity)?;

        let capability = slot
            .get_or_try_init(|| async move {
                let capability = init().await?;
                self.constructions.fetch_add(1, Ordering::Relaxed);
                Ok::<_, ExecutionError>(Arc::new(capability))
            })
            .await?;

        Ok(Arc::clone(capability))
    }

    /// Cached capability, if already built
    pub fn get(&self, identity: &ModelIdentity) -> Option<Arc<ExplainCapability>> {
        let slots = self.slots.lock().ok()?;
        slots.get(identity).and_then(|slot| slot.get().cloned())
    }

    pub fn contains(&self, identity: &ModelIdentity) -> bool {
        self.get(identity).is_some()
    }

    /// Number of built capabilities
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .map(|slots| slots.values().filter(|slot| slot.initialized()).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total successful constructions since creation
    pub fn constructions(&self) -> u64 {
        self.constructions.load(Ordering::Relaxed)
    }

    fn slot(&self, identity: &ModelIdentity) -> ExecutionResult<Slot> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| ExecutionError::CachePoisoned)?;
        Ok(Arc::clone(slots.entry(identity.clone()).or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explain::MemoryExplainStore;
    use crate::query::{ModelDescriptor, SchemaDefinition};
    use std::sync::atomic::AtomicUsize;

    fn model(name: &str) -> ModelDescriptor {
        ModelDescriptor::new(name, SchemaDefinition::new(["key1"]))
    }

    #[tokio::test]
    async fn test_sequential_access_builds_once() {
        let store = Arc::new(MemoryExplainStore::accepting());
        let cache = CapabilityCache::new();
        let users = model("users");

        for _ in 0..3 {
            let cap = cache
                .get_or_try_init(&users.identity, || {
                    ExplainCapability::build(&users, "explain_", store.clone())
                })
                .await
                .unwrap();
            assert_eq!(cap.name(), "explain_users");
        }

        assert_eq!(cache.constructions(), 1);
        assert_eq!(store.registrations(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_access_builds_once() {
        let store = Arc::new(MemoryExplainStore::accepting());
        let cache = Arc::new(CapabilityCache::new());
        let users = Arc::new(model("users"));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let store = Arc::clone(&store);
                let users = Arc::clone(&users);
                tokio::spawn(async move {
                    cache
                        .get_or_try_init(&users.identity, || {
                            ExplainCapability::build(&users, "explain_", store)
                        })
                        .await
                        .map(|cap| cap.name().to_string())
                })
            })
            .collect();

        for result in futures_util::future::join_all(handles).await {
            assert_eq!(result.unwrap().unwrap(), "explain_users");
        }

        assert_eq!(cache.constructions(), 1);
        assert_eq!(store.registrations(), 1);
    }

    #[tokio::test]
    async fn test_distinct_identities_get_distinct_capabilities() {
        let store = Arc::new(MemoryExplainStore::accepting());
        let cache = CapabilityCache::new();

        for name in ["users", "posts"] {
            let m = model(name);
            cache
                .get_or_try_init(&m.identity, || {
                    ExplainCapability::build(&m, "explain_", store.clone())
                })
                .await
                .unwrap();
        }

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&ModelIdentity::new("posts")));
        assert_eq!(
            store.registered_names(),
            vec!["explain_posts".to_string(), "explain_users".to_string()]
        );
    }

    #[tokio::test]
    async fn test_failed_init_is_not_cached() {
        let cache = CapabilityCache::new();
        let identity = ModelIdentity::new("users");
        let attempts = AtomicUsize::new(0);

        let err = cache
            .get_or_try_init(&identity, || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(ExecutionError::registration("explain_users", "store offline"))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Registration { .. }));
        assert!(!cache.contains(&identity));

        let store = Arc::new(MemoryExplainStore::accepting());
        let users = model("users");
        cache
            .get_or_try_init(&identity, || {
                ExplainCapability::build(&users, "explain_", store.clone())
            })
            .await
            .unwrap();

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(cache.constructions(), 1);
        assert!(cache.contains(&identity));
    }
}
