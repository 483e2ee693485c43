//! explain-guard - reject queries whose winning plan is a full collection
//! scan or an in-memory sort
//!
//! Before a guarded query runs, the guard re-issues it in explain mode
//! through a derived sibling model, walks the winning plan and fails the
//! query when any node is a `COLLSCAN` or a `SORT`.

pub mod cli;
pub mod config;
pub mod core;
pub mod explain;
pub mod guard;
pub mod observability;
pub mod plan;
pub mod query;
