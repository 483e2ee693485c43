//! Guarded query descriptor
//!
//! One descriptor per query execution attempt. Conditions and options are
//! kept as JSON objects exactly as the caller issued them.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::model::ModelIdentity;

/// Query operations the guard can intercept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryOperation {
    FindOne,
    Find,
    Count,
    UpdateOne,
    UpdateMany,
    FindOneAndDelete,
    FindOneAndUpdate,
}

impl QueryOperation {
    /// Every guarded operation
    pub const ALL: [QueryOperation; 7] = [
        QueryOperation::FindOne,
        QueryOperation::Find,
        QueryOperation::Count,
        QueryOperation::UpdateOne,
        QueryOperation::UpdateMany,
        QueryOperation::FindOneAndDelete,
        QueryOperation::FindOneAndUpdate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryOperation::FindOne => "findOne",
            QueryOperation::Find => "find",
            QueryOperation::Count => "count",
            QueryOperation::UpdateOne => "updateOne",
            QueryOperation::UpdateMany => "updateMany",
            QueryOperation::FindOneAndDelete => "findOneAndDelete",
            QueryOperation::FindOneAndUpdate => "findOneAndUpdate",
        }
    }
}

impl fmt::Display for QueryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The query being guarded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    pub model: ModelIdentity,
    pub operation: QueryOperation,
    #[serde(default)]
    pub conditions: Map<String, Value>,
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl QueryDescriptor {
    pub fn new(model: impl Into<ModelIdentity>, operation: QueryOperation) -> Self {
        Self {
            model: model.into(),
            operation,
            conditions: Map::new(),
            options: Map::new(),
        }
    }

    /// Adds a filter condition
    pub fn with_condition(mut self, field: impl Into<String>, predicate: Value) -> Self {
        self.conditions.insert(field.into(), predicate);
        self
    }

    /// Sets the sort option
    pub fn with_sort(self, sort: Value) -> Self {
        self.with_option("sort", sort)
    }

    /// Sets an execution option
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Sort option, if one was given and is not null
    pub fn sort(&self) -> Option<&Value> {
        self.options.get("sort").filter(|v| !v.is_null())
    }

    /// Call that reproduces this query, e.g. `users.find({"a":1}, {})`
    pub fn replay_hint(&self) -> String {
        format!(
            "{}.{}({}, {})",
            self.model,
            self.operation,
            Value::Object(self.conditions.clone()),
            Value::Object(self.options.clone())
        )
    }
}
