//! # Core Module
//!
//! Host-side execution pipeline the plan guard plugs into: a unified
//! operation model, middleware chain and executor seam.

pub mod context;
pub mod error;
pub mod middleware;
pub mod operation;
pub mod pipeline;

pub use context::RequestContext;
pub use error::{CoreError, CoreResult};
pub use middleware::guard::{GuardMiddleware, GUARD_METADATA_KEY};
pub use middleware::Middleware;
pub use operation::{InsertOp, Operation};
pub use pipeline::{Next, OperationExecutor, OperationResult, Pipeline};
