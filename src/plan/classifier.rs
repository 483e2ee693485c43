//! Winning-plan classifier
//!
//! Walks the plan depth-first, judging each node before its children.
//! The costly stage usually sits below wrapper stages (projection, fetch,
//! limit), so every node is inspected, not just the root.
//!
//! Rules, in order, at every node:
//! 1. `COLLSCAN` rejects with the node's filter
//! 2. `SORT` rejects with the node's sort pattern
//! 3. Otherwise each child is classified in order; the first rejection wins

use super::errors::{ClassificationError, ClassifyResult};
use super::node::{PlanNode, Stage};

/// Classifies a winning plan. Pure and deterministic.
pub fn classify(node: &PlanNode) -> ClassifyResult {
    match node.stage() {
        Stage::CollectionScan => Err(ClassificationError::full_scan(node.filter().cloned())),
        Stage::Sort => Err(ClassificationError::in_memory_sort(
            node.sort_pattern().cloned(),
        )),
        _ => node.children().iter().try_for_each(classify),
    }
}
