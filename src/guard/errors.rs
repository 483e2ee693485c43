//! Guard errors
//!
//! A guard failure is either a rejected plan or a failed explain round
//! trip, decorated at the guard boundary with the call that reproduces the
//! query. The structured fields of the underlying error are never altered.

use serde_json::Value;
use thiserror::Error;

use crate::explain::ExecutionError;
use crate::plan::ClassificationError;

/// What went wrong
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GuardErrorKind {
    /// The winning plan needs an index
    #[error(transparent)]
    Rejected(#[from] ClassificationError),

    /// The explain round trip failed
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// Error surfaced to the caller of a guarded query
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}. You may have executed: {replay}")]
pub struct GuardError {
    kind: GuardErrorKind,
    replay: String,
}

impl GuardError {
    pub fn new(kind: impl Into<GuardErrorKind>, replay: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            replay: replay.into(),
        }
    }

    pub fn kind(&self) -> &GuardErrorKind {
        &self.kind
    }

    /// `ExplainError` for rejected plans, `ExecutionError` otherwise
    pub fn name(&self) -> &'static str {
        match &self.kind {
            GuardErrorKind::Rejected(err) => err.kind(),
            GuardErrorKind::Execution(_) => "ExecutionError",
        }
    }

    /// Whether the query was rejected for efficiency (as opposed to an
    /// infrastructure failure)
    pub fn is_rejection(&self) -> bool {
        matches!(self.kind, GuardErrorKind::Rejected(_))
    }

    pub fn classification(&self) -> Option<&ClassificationError> {
        match &self.kind {
            GuardErrorKind::Rejected(err) => Some(err),
            GuardErrorKind::Execution(_) => None,
        }
    }

    pub fn execution(&self) -> Option<&ExecutionError> {
        match &self.kind {
            GuardErrorKind::Execution(err) => Some(err),
            GuardErrorKind::Rejected(_) => None,
        }
    }

    /// Planner tag of the disqualifying stage, for rejections
    pub fn stage_name(&self) -> Option<&'static str> {
        self.classification().map(ClassificationError::stage_name)
    }

    pub fn filter(&self) -> Option<&Value> {
        self.classification().and_then(ClassificationError::filter)
    }

    pub fn sort_pattern(&self) -> Option<&Value> {
        self.classification().and_then(ClassificationError::sort_pattern)
    }

    /// Call that reproduces the offending query
    pub fn replay(&self) -> &str {
        &self.replay
    }

    pub fn code(&self) -> &'static str {
        match &self.kind {
            GuardErrorKind::Rejected(err) => err.code(),
            GuardErrorKind::Execution(err) => err.code(),
        }
    }
}

/// Result type for guard operations
pub type GuardResult<T> = Result<T, GuardError>;
