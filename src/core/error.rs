//! Core Error Types
//!
//! Unified error handling for the execution pipeline.

use std::fmt;

use crate::guard::GuardError;

/// Core module result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
#[derive(Debug)]
pub enum CoreError {
    /// Query rejected by the plan guard: it needs an index
    Rejected(GuardError),

    /// The guard could not obtain a plan
    ExplainFailed(GuardError),

    /// Validation error
    Validation(String),

    /// Execution error
    Execution(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(err) => write!(f, "Query rejected: {}", err),
            Self::ExplainFailed(err) => write!(f, "Explain failed: {}", err),
            Self::Validation(msg) => write!(f, "Validation error: {}", msg),
            Self::Execution(msg) => write!(f, "Execution error: {}", msg),
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Rejected(err) | Self::ExplainFailed(err) => Some(err),
            _ => None,
        }
    }
}

impl CoreError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an execution error
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Guard error behind this failure, if any
    pub fn guard_error(&self) -> Option<&GuardError> {
        match self {
            Self::Rejected(err) | Self::ExplainFailed(err) => Some(err),
            _ => None,
        }
    }

    /// Get error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::Rejected(err) | Self::ExplainFailed(err) => err.code(),
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Execution(_) => "EXECUTION_ERROR",
        }
    }
}

impl From<GuardError> for CoreError {
    fn from(err: GuardError) -> Self {
        if err.is_rejection() {
            Self::Rejected(err)
        } else {
            Self::ExplainFailed(err)
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Validation(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explain::ExecutionError;
    use crate::plan::ClassificationError;

    #[test]
    fn test_guard_errors_map_by_kind() {
        let rejected = CoreError::from(GuardError::new(
            ClassificationError::in_memory_sort(None),
            "m.find({}, {})",
        ));
        assert!(matches!(rejected, CoreError::Rejected(_)));
        assert_eq!(rejected.code(), "EXPLAIN_GUARD_IN_MEMORY_SORT");

        let failed = CoreError::from(GuardError::new(ExecutionError::NoPlanRecords, "m.find({}, {})"));
        assert!(matches!(failed, CoreError::ExplainFailed(_)));
        assert!(failed.guard_error().is_some());
    }
}
