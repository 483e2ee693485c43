//! Classification errors
//!
//! Error codes:
//! - EXPLAIN_GUARD_FULL_SCAN (REJECT)
//! - EXPLAIN_GUARD_IN_MEMORY_SORT (REJECT)

use serde_json::Value;
use thiserror::Error;

use super::node::Stage;

/// Error kind reported to query callers for rejected plans
pub const EXPLAIN_ERROR_KIND: &str = "ExplainError";

/// A winning plan contains a disqualifying stage.
///
/// Constructed once at the failing node and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassificationError {
    /// The plan scans the whole collection
    #[error("Abnormal stage [COLLSCAN]. Filter is {}", render(.filter))]
    FullScan { filter: Option<Value> },

    /// The plan sorts in memory
    #[error("Abnormal stage [SORT]. SortPattern is {}", render(.sort_pattern))]
    InMemorySort { sort_pattern: Option<Value> },
}

fn render(value: &Option<Value>) -> String {
    value
        .as_ref()
        .map_or_else(|| "null".to_string(), Value::to_string)
}

impl ClassificationError {
    pub fn full_scan(filter: Option<Value>) -> Self {
        Self::FullScan { filter }
    }

    pub fn in_memory_sort(sort_pattern: Option<Value>) -> Self {
        Self::InMemorySort { sort_pattern }
    }

    /// Always `ExplainError`
    pub fn kind(&self) -> &'static str {
        EXPLAIN_ERROR_KIND
    }

    /// Stage that fired the rule
    pub fn stage(&self) -> Stage {
        match self {
            Self::FullScan { .. } => Stage::CollectionScan,
            Self::InMemorySort { .. } => Stage::Sort,
        }
    }

    /// Planner tag of the stage that fired the rule
    pub fn stage_name(&self) -> &'static str {
        match self {
            Self::FullScan { .. } => "COLLSCAN",
            Self::InMemorySort { .. } => "SORT",
        }
    }

    pub fn filter(&self) -> Option<&Value> {
        match self {
            Self::FullScan { filter } => filter.as_ref(),
            Self::InMemorySort { .. } => None,
        }
    }

    pub fn sort_pattern(&self) -> Option<&Value> {
        match self {
            Self::InMemorySort { sort_pattern } => sort_pattern.as_ref(),
            Self::FullScan { .. } => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::FullScan { .. } => "EXPLAIN_GUARD_FULL_SCAN",
            Self::InMemorySort { .. } => "EXPLAIN_GUARD_IN_MEMORY_SORT",
        }
    }
}

/// Result type for plan classification
pub type ClassifyResult = Result<(), ClassificationError>;
