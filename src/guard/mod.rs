//! Plan guard
//!
//! Interceptor → PlanProvider → classify → (allow | reject).

mod errors;
mod interceptor;

pub use errors::{GuardError, GuardErrorKind, GuardResult};
pub use interceptor::{requires_check, GuardOutcome, GuardState, PlanGuard};
