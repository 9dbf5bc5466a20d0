use std::time::{Duration, Instant};

use async_trait::async_trait;
use courier_core::Request;

use crate::context::RequestContext;
use crate::pipeline::{Next, PipelineBehavior};
use crate::short_type_name;

/// Measures wall-clock time spent in the rest of the chain.
///
/// Every request records `courier_request_duration_seconds`. Requests slower
/// than the threshold also bump `courier_slow_requests_total` and emit a
/// warning event.
#[derive(Debug, Clone, Copy)]
pub struct PerformanceBehavior {
    threshold: Duration,
}

impl PerformanceBehavior {
    #[must_use]
    pub fn new(threshold: Duration) -> Self {
        Self { threshold }
    }

    #[must_use]
    pub fn threshold(&self) -> Duration {
        self.threshold
    }
}

impl Default for PerformanceBehavior {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

#[async_trait]
impl<R: Request> PipelineBehavior<R> for PerformanceBehavior {
    async fn handle<'a>(
        &self,
        ctx: &'a RequestContext<R>,
        next: Next<'a, R::Response>,
    ) -> anyhow::Result<R::Response> {
        let start = Instant::now();
        let result = next().await;
        let elapsed = start.elapsed();

        let request_type = short_type_name::<R>();
        metrics::histogram!("courier_request_duration_seconds", "request_type" => request_type)
            .record(elapsed.as_secs_f64());

        if elapsed > self.threshold {
            metrics::counter!("courier_slow_requests_total", "request_type" => request_type)
                .increment(1);

            #[allow(clippy::cast_possible_truncation)]
            let elapsed_ms = elapsed.as_millis() as u64;
            #[allow(clippy::cast_possible_truncation)]
            let threshold_ms = self.threshold.as_millis() as u64;
            tracing::warn!(
                request_type,
                request_id = %ctx.request_id(),
                elapsed_ms,
                threshold_ms,
                "long running request"
            );
        }

        result
    }
}
