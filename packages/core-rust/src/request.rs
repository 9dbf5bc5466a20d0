//! Request contracts: the capability every dispatched value implements, the
//! command/query markers layered on top of it, and the handler trait.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::outcome::ResponseShape;

/// A value that can be dispatched to exactly one handler.
///
/// The response type is fixed by the request type, so it is always
/// discoverable from static type information alone.
pub trait Request: Send + Sync + 'static {
    /// The value the handler produces, by convention an [`Outcome`](crate::Outcome).
    type Response: ResponseShape;
}

/// A request expressing a state-changing intent.
pub trait Command: Request {}

/// A request expressing a read-only intent.
pub trait Query: Request {}

/// Executes the logic of a single request type.
///
/// `Err` is reserved for unexpected failures (I/O, bugs); expected business
/// failures belong in a failed [`Outcome`](crate::Outcome) inside `Ok`.
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync + 'static {
    /// Handles `request`. `cancellation` is advisory: the handler may observe
    /// it and stop early.
    async fn handle(&self, request: &R, cancellation: CancellationToken)
        -> anyhow::Result<R::Response>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Outcome};

    struct Ping {
        payload: String,
    }

    impl Request for Ping {
        type Response = Outcome<String>;
    }

    impl Query for Ping {}

    struct PingHandler;

    #[async_trait]
    impl RequestHandler<Ping> for PingHandler {
        async fn handle(
            &self,
            request: &Ping,
            cancellation: CancellationToken,
        ) -> anyhow::Result<Outcome<String>> {
            if cancellation.is_cancelled() {
                return Ok(Error::problem("Ping.Cancelled", "cancelled").into());
            }
            Ok(Outcome::success(request.payload.clone()))
        }
    }

    #[tokio::test]
    async fn handler_echoes_payload() {
        let request = Ping {
            payload: "pong".to_string(),
        };
        let outcome = PingHandler
            .handle(&request, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.value(), "pong");
    }

    #[tokio::test]
    async fn handler_observes_cancellation() {
        let token = CancellationToken::new();
        token.cancel();
        let request = Ping {
            payload: "pong".to_string(),
        };
        let outcome = PingHandler.handle(&request, token).await.unwrap();
        assert_eq!(outcome.error().code(), "Ping.Cancelled");
    }
}
