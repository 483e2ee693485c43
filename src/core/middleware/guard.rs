//! Plan Guard Middleware
//!
//! Checks every guarded query's winning plan before the executor runs it.
//! Non-query operations pass straight through.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::json;

use crate::core::context::RequestContext;
use crate::core::error::CoreError;
use crate::core::operation::Operation;
use crate::core::pipeline::{Next, OperationResult};
use crate::guard::{GuardState, PlanGuard};

use super::Middleware;

/// Context metadata key holding the guard's terminal state
pub const GUARD_METADATA_KEY: &str = "plan_guard";

/// Plan guard middleware
pub struct GuardMiddleware {
    guard: Arc<PlanGuard>,
}

impl GuardMiddleware {
    pub fn new(guard: Arc<PlanGuard>) -> Self {
        Self { guard }
    }

    pub fn guard(&self) -> &Arc<PlanGuard> {
        &self.guard
    }
}

/// Sets the current state and appends it to the recorded transitions
fn record_state(ctx: &mut RequestContext, state: GuardState) {
    let entry = ctx
        .metadata
        .entry(GUARD_METADATA_KEY.to_string())
        .or_insert_with(|| json!({ "transitions": [] }));

    entry["state"] = json!(state.as_str());
    entry["checked_at"] = json!(chrono::Utc::now().to_rfc3339());
    if let Some(transitions) = entry["transitions"].as_array_mut() {
        transitions.push(json!(state.as_str()));
    }
}

impl Middleware for GuardMiddleware {
    fn process<'a>(
        &'a self,
        op: &'a Operation,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> Pin<Box<dyn Future<Output = OperationResult> + Send + 'a>> {
        Box::pin(async move {
            let Some(query) = op.as_query().filter(|q| self.guard.is_guarded(q)) else {
                return next.run(op, ctx).await;
            };

            record_state(ctx, GuardState::Pending);
            if self.guard.should_intercept(query) {
                record_state(ctx, GuardState::Checking);
            }

            match self.guard.guard(query).await {
                Ok(outcome) => {
                    if let Some(state) = outcome.state() {
                        record_state(ctx, state);
                    }
                    next.run(op, ctx).await
                }
                Err(err) => {
                    record_state(ctx, GuardState::Fail);
                    Err(CoreError::from(err))
                }
            }
        })
    }
}
