//! Explain round-trip errors
//!
//! Anything that goes wrong while obtaining a winning plan. These are never
//! reinterpreted as classification failures.

use thiserror::Error;

/// Result type for explain operations
pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// The explain round trip itself failed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    /// The data store reported an error (connectivity, malformed query, ...)
    #[error("Explain execution failed: {0}")]
    Store(String),

    /// The explain sibling model could not be registered
    #[error("Failed to register explain model '{model}': {reason}")]
    Registration { model: String, reason: String },

    /// Explain returned an empty record list
    #[error("Explain returned no plan records")]
    NoPlanRecords,

    /// The first record carries no winning plan
    #[error("Explain record has no winningPlan")]
    MissingWinningPlan,

    /// The winning plan is not a valid plan tree
    #[error("Malformed winning plan: {0}")]
    MalformedPlan(String),

    /// Shared capability cache is unusable
    #[error("Capability cache lock poisoned")]
    CachePoisoned,
}

impl ExecutionError {
    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a registration error
    pub fn registration(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Registration {
            model: model.into(),
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Store(_) => "EXPLAIN_GUARD_STORE_ERROR",
            Self::Registration { .. } => "EXPLAIN_GUARD_REGISTRATION_FAILED",
            Self::NoPlanRecords => "EXPLAIN_GUARD_NO_PLAN",
            Self::MissingWinningPlan => "EXPLAIN_GUARD_NO_WINNING_PLAN",
            Self::MalformedPlan(_) => "EXPLAIN_GUARD_MALFORMED_PLAN",
            Self::CachePoisoned => "EXPLAIN_GUARD_CACHE_POISONED",
        }
    }
}

impl From<serde_json::Error> for ExecutionError {
    fn from(e: serde_json::Error) -> Self {
        Self::MalformedPlan(e.to_string())
    }
}
