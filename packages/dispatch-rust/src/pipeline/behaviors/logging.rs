use async_trait::async_trait;
use courier_core::Request;

use crate::context::RequestContext;
use crate::pipeline::{Next, PipelineBehavior};
use crate::short_type_name;

/// Emits a structured event when a request starts and when it completes.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingBehavior;

#[async_trait]
impl<R: Request> PipelineBehavior<R> for LoggingBehavior {
    async fn handle<'a>(
        &self,
        ctx: &'a RequestContext<R>,
        next: Next<'a, R::Response>,
    ) -> anyhow::Result<R::Response> {
        let request_type = short_type_name::<R>();
        tracing::info!(
            request_type,
            request_id = %ctx.request_id(),
            correlation_id = %ctx.correlation_id(),
            user_id = ctx.user_id(),
            started_at = ctx.started_at(),
            "handling request"
        );

        let result = next().await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(_) => "error",
        };
        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = ctx.duration().as_millis() as u64;
        tracing::info!(
            request_type,
            request_id = %ctx.request_id(),
            duration_ms,
            outcome,
            "handled request"
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use courier_core::{DefaultUserContext, ManualClock, Outcome};
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::context::{ContextFactoryExt, DefaultContextFactory};
    use crate::pipeline::delegate;

    struct Ping;

    impl Request for Ping {
        type Response = Outcome<u32>;
    }

    fn context() -> RequestContext<Ping> {
        DefaultContextFactory::new(
            Arc::new(DefaultUserContext::default()),
            Arc::new(ManualClock::new(0)),
        )
        .create(Ping, CancellationToken::new())
        .unwrap()
    }

    #[tokio::test]
    async fn passes_response_through() {
        let ctx = context();
        let response = LoggingBehavior
            .handle(&ctx, delegate(|| async { Ok(Outcome::success(7)) }))
            .await
            .unwrap();
        assert_eq!(*response.value(), 7);
    }

    #[tokio::test]
    async fn passes_error_through() {
        let ctx = context();
        let err = LoggingBehavior
            .handle(
                &ctx,
                delegate(|| async { Err::<Outcome<u32>, _>(anyhow::anyhow!("down")) }),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "down");
    }
}
