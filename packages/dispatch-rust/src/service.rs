//! `tower` adapter for one request type.

use std::marker::PhantomData;
use std::sync::Arc;
use std::task::{Context, Poll};

use courier_core::Request;
use tower::Service;

use crate::error::MediatorError;
use crate::mediator::Mediator;
use crate::pipeline::BoxFuture;

/// Exposes [`Mediator::send`] for requests of type `R` as a
/// [`tower::Service`], so ordinary tower layers can wrap dispatch.
///
/// Always ready: the mediator holds no per-call capacity.
pub struct MediatorService<R> {
    mediator: Arc<Mediator>,
    _request: PhantomData<fn(R)>,
}

impl<R> MediatorService<R> {
    #[must_use]
    pub fn new(mediator: Arc<Mediator>) -> Self {
        Self {
            mediator,
            _request: PhantomData,
        }
    }
}

impl<R> Clone for MediatorService<R> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.mediator))
    }
}

impl<R> std::fmt::Debug for MediatorService<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediatorService")
            .field("request_type", &crate::short_type_name::<R>())
            .finish()
    }
}

impl<R: Request> Service<R> for MediatorService<R> {
    type Response = R::Response;
    type Error = MediatorError;
    type Future = BoxFuture<'static, Result<R::Response, MediatorError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: R) -> Self::Future {
        let mediator = Arc::clone(&self.mediator);
        Box::pin(async move { mediator.send(request).await })
    }
}
