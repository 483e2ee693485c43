//! Host-side explain execution
//!
//! The guard never talks to a storage engine. The host supplies an
//! `ExplainStore` that can register a derived model and run a find against
//! it in explain mode.

use std::future::Future;
use std::pin::Pin;

use serde_json::{Map, Value};

use super::errors::ExecutionResult;
use crate::query::SchemaDefinition;

/// Future returned by store operations
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = ExecutionResult<T>> + Send + 'a>>;

/// Explain execution supplied by the host database driver
pub trait ExplainStore: Send + Sync {
    /// Whether a model named `name` is already registered
    fn has_model<'a>(&'a self, name: &'a str) -> StoreFuture<'a, bool>;

    /// Registers a queryable model named `name` over `schema`.
    ///
    /// Registering the same name twice may fail. The guard looks the name
    /// up with `has_model` first and reuses an existing registration.
    fn register_model<'a>(&'a self, name: &'a str, schema: &'a SchemaDefinition)
        -> StoreFuture<'a, ()>;

    /// Runs a find against model `model` with `options` (which carry
    /// `explain: true`) and returns the planner's records.
    fn explain_find<'a>(
        &'a self,
        model: &'a str,
        conditions: &'a Map<String, Value>,
        options: &'a Map<String, Value>,
    ) -> StoreFuture<'a, Vec<Value>>;
}
