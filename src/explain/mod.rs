//! Explain subsystem
//!
//! Obtains the winning plan for a query by re-running it in explain mode
//! through a derived sibling model.
//!
//! # Flow
//!
//! 1. `PlanProvider` looks up the model's `ExplainCapability` in the
//!    `CapabilityCache`, building and registering it on first use
//! 2. The capability runs the query with `explain: true` on the host's
//!    `ExplainStore`
//! 3. The first record's winning plan is parsed into a `PlanNode`

mod cache;
mod capability;
mod errors;
mod memory;
mod provider;
mod store;

pub use cache::CapabilityCache;
pub use capability::{winning_plan, ExplainCapability};
pub use errors::{ExecutionError, ExecutionResult};
pub use memory::{plan_query, MemoryExplainStore, Planner};
pub use provider::{PlanProvider, DEFAULT_EXPLAIN_PREFIX};
pub use store::{ExplainStore, StoreFuture};
