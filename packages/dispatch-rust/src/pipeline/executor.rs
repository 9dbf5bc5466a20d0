use std::sync::Arc;

use courier_core::Request;

use super::behavior::{BoxFuture, Next, PipelineBehavior};
use crate::context::RequestContext;

/// Composes behaviors around a terminal delegate.
///
/// The first behavior in the slice is outermost: it runs first before `next`
/// and last after it. An empty slice calls the delegate directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct PipelineExecutor;

impl PipelineExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Builds the chain for one dispatch and returns its future.
    ///
    /// Nothing runs until the returned future is polled.
    pub fn execute<'a, R: Request>(
        &self,
        ctx: &'a RequestContext<R>,
        behaviors: &[Arc<dyn PipelineBehavior<R>>],
        delegate: Next<'a, R::Response>,
    ) -> BoxFuture<'a, anyhow::Result<R::Response>> {
        let mut next = delegate;
        for behavior in behaviors.iter().rev() {
            let behavior = Arc::clone(behavior);
            let inner = next;
            next = Box::new(move || -> BoxFuture<'a, anyhow::Result<R::Response>> {
                Box::pin(async move { behavior.handle(ctx, inner).await })
            });
        }
        next()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use courier_core::{DefaultUserContext, ManualClock, Outcome};
    use parking_lot::Mutex;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::context::{ContextFactoryExt, DefaultContextFactory};
    use crate::pipeline::behavior::delegate;

    struct Echo(String);

    impl Request for Echo {
        type Response = Outcome<String>;
    }

    /// Records entry and exit into a shared log.
    struct Recording {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl PipelineBehavior<Echo> for Recording {
        async fn handle<'a>(
            &self,
            ctx: &'a RequestContext<Echo>,
            next: Next<'a, Outcome<String>>,
        ) -> anyhow::Result<Outcome<String>> {
            self.log.lock().push(format!("{}:before", self.name));
            ctx.add_item(self.name, true)?;
            let result = next().await;
            self.log.lock().push(format!("{}:after", self.name));
            result
        }
    }

    /// Answers without calling `next`.
    struct ShortCircuit;

    #[async_trait]
    impl PipelineBehavior<Echo> for ShortCircuit {
        async fn handle<'a>(
            &self,
            _ctx: &'a RequestContext<Echo>,
            _next: Next<'a, Outcome<String>>,
        ) -> anyhow::Result<Outcome<String>> {
            Ok(Outcome::success("cached".to_string()))
        }
    }

    fn context(text: &str) -> RequestContext<Echo> {
        DefaultContextFactory::new(
            Arc::new(DefaultUserContext::default()),
            Arc::new(ManualClock::new(0)),
        )
        .create(Echo(text.to_string()), CancellationToken::new())
        .unwrap()
    }

    fn recording(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Arc<dyn PipelineBehavior<Echo>> {
        Arc::new(Recording {
            name,
            log: Arc::clone(log),
        })
    }

    #[tokio::test]
    async fn behaviors_wrap_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let behaviors = vec![
            recording("b1", &log),
            recording("b2", &log),
            recording("b3", &log),
        ];
        let ctx = context("hi");

        let handler_log = Arc::clone(&log);
        let ctx_ref = &ctx;
        let terminal = delegate(move || async move {
            handler_log.lock().push("handler".to_string());
            Ok(Outcome::success(ctx_ref.request().0.clone()))
        });

        let response = PipelineExecutor::new()
            .execute(&ctx, &behaviors, terminal)
            .await
            .unwrap();

        assert_eq!(response.value(), "hi");
        assert_eq!(
            *log.lock(),
            vec![
                "b1:before", "b2:before", "b3:before", "handler", "b3:after", "b2:after",
                "b1:after",
            ]
        );
        assert_eq!(ctx.try_get_item::<bool>("b3"), Some(true));
    }

    #[tokio::test]
    async fn empty_chain_calls_delegate_directly() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let ctx = context("direct");
        let terminal = delegate(move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Outcome::success("direct".to_string()))
        });

        let response = PipelineExecutor::new()
            .execute(&ctx, &[], terminal)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(response.value(), "direct");
    }

    #[tokio::test]
    async fn short_circuit_skips_rest_of_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let behaviors = vec![
            recording("outer", &log),
            Arc::new(ShortCircuit) as Arc<dyn PipelineBehavior<Echo>>,
            recording("inner", &log),
        ];
        let handler_calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&handler_calls);
        let ctx = context("x");
        let terminal = delegate(move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Outcome::success("handled".to_string()))
        });

        let response = PipelineExecutor::new()
            .execute(&ctx, &behaviors, terminal)
            .await
            .unwrap();

        assert_eq!(response.value(), "cached");
        assert_eq!(handler_calls.load(Ordering::SeqCst), 0);
        assert_eq!(*log.lock(), vec!["outer:before", "outer:after"]);
    }

    #[tokio::test]
    async fn delegate_error_propagates_through_behaviors() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let behaviors = vec![recording("only", &log)];
        let ctx = context("boom");
        let terminal = delegate(|| async { Err(anyhow::anyhow!("handler exploded")) });

        let err = PipelineExecutor::new()
            .execute(&ctx, &behaviors, terminal)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "handler exploded");
        assert_eq!(*log.lock(), vec!["only:before", "only:after"]);
    }
}
