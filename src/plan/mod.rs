//! Winning-plan model and classifier
//!
//! A plan is acceptable when no node, at any depth, is a full collection
//! scan (`COLLSCAN`) or an in-memory sort (`SORT`).

mod classifier;
mod errors;
mod node;
mod report;

pub use classifier::classify;
pub use errors::{ClassificationError, ClassifyResult, EXPLAIN_ERROR_KIND};
pub use node::{PlanNode, Stage};
pub use report::PlanReport;
