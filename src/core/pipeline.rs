//! Guarded execution pipeline
//!
//! Operations pass through each middleware in registration order before the
//! host executor sees them. A middleware that returns early stops the chain.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use super::context::RequestContext;
use super::error::CoreResult;
use super::middleware::Middleware;
use super::operation::Operation;

/// Value returned by the host executor
pub type OperationResult = CoreResult<Value>;

/// Remainder of the chain after the current middleware
pub struct Next<'a> {
    remaining: &'a [Arc<dyn Middleware>],
    executor: &'a dyn OperationExecutor,
}

impl<'a> Next<'a> {
    /// Hands `op` to the following middleware, or to the executor when the
    /// chain is exhausted
    pub fn run(
        self,
        op: &'a Operation,
        ctx: &'a mut RequestContext,
    ) -> Pin<Box<dyn Future<Output = OperationResult> + Send + 'a>> {
        match self.remaining.split_first() {
            Some((stage, rest)) => stage.process(
                op,
                ctx,
                Next {
                    remaining: rest,
                    executor: self.executor,
                },
            ),
            None => self.executor.execute(op, ctx),
        }
    }
}

/// Host-side query execution, reached only when every middleware allowed it
pub trait OperationExecutor: Send + Sync {
    fn execute<'a>(
        &'a self,
        op: &'a Operation,
        ctx: &'a RequestContext,
    ) -> Pin<Box<dyn Future<Output = OperationResult> + Send + 'a>>;
}

/// Middleware chain in front of one executor
pub struct Pipeline {
    stages: Vec<Arc<dyn Middleware>>,
    executor: Arc<dyn OperationExecutor>,
}

impl Pipeline {
    pub fn new(executor: impl OperationExecutor + 'static) -> Self {
        Self {
            stages: Vec::new(),
            executor: Arc::new(executor),
        }
    }

    /// Appends a middleware; earlier ones run first
    pub fn with_middleware(mut self, stage: impl Middleware + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    pub async fn execute(&self, op: Operation, ctx: RequestContext) -> OperationResult {
        self.execute_with_context(op, ctx).await.0
    }

    /// Like `execute`, also returning the context so callers can read what
    /// middleware recorded
    pub async fn execute_with_context(
        &self,
        op: Operation,
        mut ctx: RequestContext,
    ) -> (OperationResult, RequestContext) {
        let chain = Next {
            remaining: &self.stages,
            executor: self.executor.as_ref(),
        };
        let result = chain.run(&op, &mut ctx).await;
        (result, ctx)
    }
}

/// Executor that echoes the operation name
#[cfg(test)]
pub(crate) struct EchoExecutor;

#[cfg(test)]
impl OperationExecutor for EchoExecutor {
    fn execute<'a>(
        &'a self,
        op: &'a Operation,
        _ctx: &'a RequestContext,
    ) -> Pin<Box<dyn Future<Output = OperationResult> + Send + 'a>> {
        Box::pin(async move { Ok(serde_json::json!({ "operation": op.name() })) })
    }
}
