//! The dispatcher: resolves the handler for a request, opens its context and
//! runs the behavior chain around it.

use std::any::type_name;
use std::sync::Arc;

use courier_core::{ClockSource, DefaultUserContext, Request, SystemClock, UserContext};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::context::{ContextFactoryExt, DefaultContextFactory, RequestContextFactory};
use crate::error::MediatorError;
use crate::pipeline::{handler_delegate, BoxFuture, PipelineExecutor};
use crate::registry::HandlerRegistry;
use crate::resolver::{HandlerResolver, ResolverExt};
use crate::short_type_name;

// ---------------------------------------------------------------------------
// Mediator
// ---------------------------------------------------------------------------

/// In-process request dispatcher.
///
/// Stateless per call: every dispatch gets its own context and cancellation
/// token, and the resolver is read-only, so one mediator can serve many
/// concurrent callers.
#[derive(Clone)]
pub struct Mediator {
    resolver: Arc<dyn HandlerResolver>,
    contexts: Arc<dyn RequestContextFactory>,
    executor: PipelineExecutor,
}

impl Mediator {
    #[must_use]
    pub fn new(
        resolver: Arc<dyn HandlerResolver>,
        contexts: Arc<dyn RequestContextFactory>,
    ) -> Self {
        Self {
            resolver,
            contexts,
            executor: PipelineExecutor::new(),
        }
    }

    #[must_use]
    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::default()
    }

    /// Dispatches `request` with a fresh cancellation token.
    ///
    /// # Errors
    ///
    /// See [`Mediator::send_with_cancellation`].
    pub async fn send<R: Request>(&self, request: R) -> Result<R::Response, MediatorError> {
        self.send_with_cancellation(request, CancellationToken::new())
            .await
    }

    /// Dispatches `request` to its handler through the registered behaviors.
    ///
    /// `cancellation` is handed unchanged to every behavior and the handler.
    ///
    /// # Errors
    ///
    /// - [`MediatorError::HandlerNotFound`] if no handler is registered for `R`.
    /// - [`MediatorError::RequestHandling`] if context creation, a behavior or
    ///   the handler fails; the original failure is the error's source.
    pub async fn send_with_cancellation<R: Request>(
        &self,
        request: R,
        cancellation: CancellationToken,
    ) -> Result<R::Response, MediatorError> {
        let request_type = type_name::<R>();

        let Some(handler) = self.resolver.handler_for::<R>() else {
            tracing::warn!(request_type, "no handler registered for request");
            return Err(MediatorError::HandlerNotFound { request_type });
        };

        let ctx = self
            .contexts
            .create(request, cancellation)
            .map_err(|source| {
                tracing::error!(request_type, error = %source, "failed to create request context");
                MediatorError::handling(request_type, source)
            })?;

        let behaviors = self.resolver.behaviors_for::<R>();
        let span = tracing::info_span!(
            "dispatch",
            request_type = short_type_name::<R>(),
            request_id = %ctx.request_id(),
            correlation_id = %ctx.correlation_id(),
        );

        let result = self
            .executor
            .execute(&ctx, &behaviors, handler_delegate(handler, &ctx))
            .instrument(span)
            .await;
        ctx.mark_finished();

        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = ctx.duration().as_millis() as u64;
        match result {
            Ok(response) => {
                tracing::debug!(
                    request_type,
                    request_id = %ctx.request_id(),
                    duration_ms,
                    "request dispatched"
                );
                Ok(response)
            }
            Err(source) => {
                tracing::error!(
                    request_type,
                    request_id = %ctx.request_id(),
                    duration_ms,
                    error = %source,
                    "request handling failed"
                );
                Err(MediatorError::handling(request_type, source))
            }
        }
    }

    /// Dispatches a request whose concrete type is erased, with a fresh
    /// cancellation token.
    ///
    /// The handler, behaviors and context are still those of the concrete
    /// type boxed in `request`.
    ///
    /// # Errors
    ///
    /// Same as [`Mediator::send_with_cancellation`].
    pub async fn send_dyn<T>(&self, request: BoxedRequest<T>) -> Result<T, MediatorError> {
        self.send_dyn_with_cancellation(request, CancellationToken::new())
            .await
    }

    /// Erased counterpart of [`Mediator::send_with_cancellation`].
    ///
    /// # Errors
    ///
    /// Same as [`Mediator::send_with_cancellation`].
    pub async fn send_dyn_with_cancellation<T>(
        &self,
        request: BoxedRequest<T>,
        cancellation: CancellationToken,
    ) -> Result<T, MediatorError> {
        request.dispatch(self, cancellation).await
    }
}

impl std::fmt::Debug for Mediator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mediator").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Erased requests
// ---------------------------------------------------------------------------

/// A request whose concrete type is known only to itself.
///
/// Implemented for every [`Request`]; dispatching calls back into the
/// mediator with the concrete type restored.
pub trait DynRequest<T>: Send {
    /// Fully qualified name of the concrete request type.
    fn request_type(&self) -> &'static str;

    fn dispatch<'m>(
        self: Box<Self>,
        mediator: &'m Mediator,
        cancellation: CancellationToken,
    ) -> BoxFuture<'m, Result<T, MediatorError>>;
}

impl<R: Request> DynRequest<R::Response> for R {
    fn request_type(&self) -> &'static str {
        type_name::<R>()
    }

    fn dispatch<'m>(
        self: Box<Self>,
        mediator: &'m Mediator,
        cancellation: CancellationToken,
    ) -> BoxFuture<'m, Result<R::Response, MediatorError>> {
        Box::pin(mediator.send_with_cancellation(*self, cancellation))
    }
}

/// Boxed request expecting a response of type `T`.
pub type BoxedRequest<T> = Box<dyn DynRequest<T>>;

// ---------------------------------------------------------------------------
// MediatorBuilder
// ---------------------------------------------------------------------------

/// Assembles a [`Mediator`] from its collaborators.
///
/// Unset collaborators default to an empty registry, a
/// [`DefaultUserContext`] and the [`SystemClock`]. An explicit context
/// factory takes precedence over the user context and clock.
#[derive(Default)]
pub struct MediatorBuilder {
    resolver: Option<Arc<dyn HandlerResolver>>,
    context_factory: Option<Arc<dyn RequestContextFactory>>,
    user_context: Option<Arc<dyn UserContext>>,
    clock: Option<Arc<dyn ClockSource>>,
}

impl MediatorBuilder {
    #[must_use]
    pub fn registry(self, registry: HandlerRegistry) -> Self {
        self.resolver(Arc::new(registry))
    }

    #[must_use]
    pub fn resolver(mut self, resolver: Arc<dyn HandlerResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    #[must_use]
    pub fn context_factory(mut self, factory: Arc<dyn RequestContextFactory>) -> Self {
        self.context_factory = Some(factory);
        self
    }

    #[must_use]
    pub fn user_context(mut self, user_context: Arc<dyn UserContext>) -> Self {
        self.user_context = Some(user_context);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn ClockSource>) -> Self {
        self.clock = Some(clock);
        self
    }

    #[must_use]
    pub fn build(self) -> Mediator {
        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(HandlerRegistry::default()));
        let contexts = self.context_factory.unwrap_or_else(|| {
            Arc::new(DefaultContextFactory::new(
                self.user_context
                    .unwrap_or_else(|| Arc::new(DefaultUserContext::default())),
                self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            ))
        });
        Mediator::new(resolver, contexts)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use async_trait::async_trait;
    use courier_core::{ManualClock, Outcome, RequestHandler};

    use super::*;
    use crate::context::ContextHeader;

    struct Greet {
        name: String,
    }

    impl Request for Greet {
        type Response = Outcome<String>;
    }

    struct Unrouted;

    impl Request for Unrouted {
        type Response = Outcome;
    }

    struct GreetHandler;

    #[async_trait]
    impl RequestHandler<Greet> for GreetHandler {
        async fn handle(
            &self,
            request: &Greet,
            _cancellation: CancellationToken,
        ) -> anyhow::Result<Outcome<String>> {
            Ok(Outcome::success(format!("hello {}", request.name)))
        }
    }

    struct BrokenFactory;

    impl RequestContextFactory for BrokenFactory {
        fn open(&self, _request_type: &'static str) -> anyhow::Result<ContextHeader> {
            anyhow::bail!("clock unavailable")
        }
    }

    fn mediator() -> Mediator {
        let registry = HandlerRegistry::builder()
            .handler::<Greet, _>(GreetHandler)
            .build()
            .unwrap();
        Mediator::builder()
            .registry(registry)
            .clock(Arc::new(ManualClock::new(0)))
            .build()
    }

    #[tokio::test]
    async fn send_reaches_handler() {
        let response = mediator()
            .send(Greet {
                name: "ada".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.value(), "hello ada");
    }

    #[tokio::test]
    async fn missing_handler_names_request_type() {
        let err = mediator().send(Unrouted).await.unwrap_err();
        assert!(err.is_handler_not_found());
        assert!(err.to_string().contains(type_name::<Unrouted>()));
    }

    #[tokio::test]
    async fn context_factory_failure_is_wrapped() {
        let registry = HandlerRegistry::builder()
            .handler::<Greet, _>(GreetHandler)
            .build()
            .unwrap();
        let mediator = Mediator::builder()
            .registry(registry)
            .context_factory(Arc::new(BrokenFactory))
            .build();

        let err = mediator
            .send(Greet {
                name: "ada".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, MediatorError::RequestHandling { .. }));
        assert!(err.to_string().contains(type_name::<Greet>()));
        assert_eq!(err.source().unwrap().to_string(), "clock unavailable");
    }

    #[tokio::test]
    async fn send_dyn_uses_concrete_type() {
        let request: BoxedRequest<Outcome<String>> = Box::new(Greet {
            name: "erased".to_string(),
        });
        assert_eq!(request.request_type(), type_name::<Greet>());

        let response = mediator().send_dyn(request).await.unwrap();
        assert_eq!(response.value(), "hello erased");
    }

    #[tokio::test]
    async fn default_builder_has_no_handlers() {
        let err = Mediator::builder()
            .build()
            .send(Greet {
                name: String::new(),
            })
            .await
            .unwrap_err();
        assert!(err.is_handler_not_found());
    }
}
