//! Unified Operation Model
//!
//! Every request the host executes routes through this enum, so the guard
//! middleware sees each one before the executor does.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::query::{ModelIdentity, QueryDescriptor};

/// Operations carried through the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Read, count or update driven by a filter
    Query(QueryDescriptor),
    /// Insert one document
    Insert(InsertOp),
}

impl Operation {
    /// Target model
    pub fn model(&self) -> &ModelIdentity {
        match self {
            Self::Query(q) => &q.model,
            Self::Insert(i) => &i.model,
        }
    }

    /// Get operation name for metrics/logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::Query(q) => q.operation.as_str(),
            Self::Insert(_) => "insert",
        }
    }

    /// Guarded query, if this is one
    pub fn as_query(&self) -> Option<&QueryDescriptor> {
        match self {
            Self::Query(q) => Some(q),
            Self::Insert(_) => None,
        }
    }
}

/// Insert a new document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertOp {
    pub model: ModelIdentity,
    pub document: Value,
}
