use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use courier_core::{Request, RequestHandler};

use crate::context::RequestContext;

/// Boxed, `Send` future borrowing for `'a`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Continuation handed to a behavior: runs the rest of the chain.
///
/// Single-shot. A behavior that returns without calling it short-circuits
/// every later behavior and the handler.
pub type Next<'a, T> = Box<dyn FnOnce() -> BoxFuture<'a, anyhow::Result<T>> + Send + 'a>;

/// Cross-cutting step wrapped around handler invocation.
///
/// Behaviors may run logic before and after calling `next`, replace the
/// response, or return their own response without calling `next`.
#[async_trait]
pub trait PipelineBehavior<R: Request>: Send + Sync + 'static {
    async fn handle<'a>(
        &self,
        ctx: &'a RequestContext<R>,
        next: Next<'a, R::Response>,
    ) -> anyhow::Result<R::Response>;
}

/// Wraps an async closure as a [`Next`] continuation.
pub fn delegate<'a, T, F, Fut>(f: F) -> Next<'a, T>
where
    F: FnOnce() -> Fut + Send + 'a,
    Fut: Future<Output = anyhow::Result<T>> + Send + 'a,
{
    Box::new(move || -> BoxFuture<'a, anyhow::Result<T>> { Box::pin(f()) })
}

/// Terminal continuation invoking `handler` with the context's request and
/// cancellation token.
pub fn handler_delegate<'a, R: Request>(
    handler: Arc<dyn RequestHandler<R>>,
    ctx: &'a RequestContext<R>,
) -> Next<'a, R::Response> {
    delegate(move || async move {
        handler
            .handle(ctx.request(), ctx.cancellation_token().clone())
            .await
    })
}
