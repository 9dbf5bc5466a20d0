use std::sync::Arc;

use courier_core::{ClockSource, DefaultUserContext, Request, SystemClock, UserContext};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{ContextHeader, RequestContext};

/// Opens a fresh context header for each dispatch.
///
/// Object safe so the mediator can hold any implementation behind an `Arc`;
/// the typed [`ContextFactoryExt::create`] is layered on top.
pub trait RequestContextFactory: Send + Sync {
    /// Produces new identifiers, the caller identity and the start time for a
    /// dispatch of `request_type`.
    ///
    /// # Errors
    ///
    /// Returns any failure reading the caller identity or clock; the mediator
    /// surfaces it as a handling failure.
    fn open(&self, request_type: &'static str) -> anyhow::Result<ContextHeader>;
}

/// Typed construction on top of [`RequestContextFactory::open`].
pub trait ContextFactoryExt {
    /// Creates the context for one dispatch of `request`.
    ///
    /// # Errors
    ///
    /// Propagates the factory's failure to open a header.
    fn create<R: Request>(
        &self,
        request: R,
        cancellation: CancellationToken,
    ) -> anyhow::Result<RequestContext<R>>;
}

impl<F: RequestContextFactory + ?Sized> ContextFactoryExt for F {
    fn create<R: Request>(
        &self,
        request: R,
        cancellation: CancellationToken,
    ) -> anyhow::Result<RequestContext<R>> {
        let header = self.open(std::any::type_name::<R>())?;
        Ok(RequestContext::new(header, request, cancellation))
    }
}

/// Factory reading the user id from a [`UserContext`] and the start time from
/// a [`ClockSource`].
pub struct DefaultContextFactory {
    user_context: Arc<dyn UserContext>,
    clock: Arc<dyn ClockSource>,
}

impl DefaultContextFactory {
    #[must_use]
    pub fn new(user_context: Arc<dyn UserContext>, clock: Arc<dyn ClockSource>) -> Self {
        Self {
            user_context,
            clock,
        }
    }
}

impl Default for DefaultContextFactory {
    fn default() -> Self {
        Self::new(Arc::new(DefaultUserContext::default()), Arc::new(SystemClock))
    }
}

impl RequestContextFactory for DefaultContextFactory {
    fn open(&self, _request_type: &'static str) -> anyhow::Result<ContextHeader> {
        let request_id = Uuid::new_v4();
        let mut correlation_id = Uuid::new_v4();
        while correlation_id == request_id {
            correlation_id = Uuid::new_v4();
        }
        Ok(ContextHeader {
            request_id,
            correlation_id,
            user_id: self.user_context.user_id(),
            started_at: self.clock.now(),
            clock: Arc::clone(&self.clock),
        })
    }
}
