//! Immutable, builder-assembled [`HandlerResolver`].

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use courier_core::{Request, RequestHandler, Validator};

use crate::config::MediatorConfig;
use crate::error::RegistryError;
use crate::pipeline::behaviors::{LoggingBehavior, PerformanceBehavior, ValidationBehavior};
use crate::pipeline::PipelineBehavior;
use crate::resolver::{HandlerResolver, ResolverExt, ServiceEntry, ServiceKey};

// ---------------------------------------------------------------------------
// HandlerRegistry
// ---------------------------------------------------------------------------

/// Registry of handlers, validators and per-request behavior chains.
///
/// Built once at startup through [`HandlerRegistry::builder`] and read-only
/// afterwards, so it can be shared across tasks without locking.
#[derive(Default)]
pub struct HandlerRegistry {
    /// Handler per `(request, response)` key.
    single: HashMap<ServiceKey, ServiceEntry>,
    /// Behaviors and validators, in registration order.
    multi: HashMap<ServiceKey, Vec<ServiceEntry>>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::default()
    }

    /// Returns `true` if a handler is registered for `R`.
    #[must_use]
    pub fn contains_handler<R: Request>(&self) -> bool {
        self.single.contains_key(&ServiceKey::handler::<R>())
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.single.len()
    }
}

impl HandlerResolver for HandlerRegistry {
    fn resolve(&self, key: &ServiceKey) -> Option<ServiceEntry> {
        self.single.get(key).cloned()
    }

    fn resolve_all(&self, key: &ServiceKey) -> Vec<ServiceEntry> {
        self.multi.get(key).cloned().unwrap_or_default()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.single.len())
            .field("chains", &self.multi.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Built-in behaviors, instantiated per request type at build time.
#[derive(Debug, Clone, Copy)]
enum StandardBehavior {
    Logging,
    Performance(Duration),
    Validation,
}

enum BehaviorRegistration {
    Standard(StandardBehavior),
    Specific { request: TypeId, entry: ServiceEntry },
}

/// Installs the behavior chain for one handler's request type.
type Installer = fn(&[BehaviorRegistration], &mut HandlerRegistry);

struct HandlerRegistration {
    key: ServiceKey,
    request_type: &'static str,
    entry: ServiceEntry,
    install: Installer,
}

/// Collects registrations and assembles a [`HandlerRegistry`].
///
/// Behaviors, standard and request-specific alike, wrap handlers in the order
/// they were registered: the first registered is outermost.
#[derive(Default)]
pub struct HandlerRegistryBuilder {
    handlers: Vec<HandlerRegistration>,
    validators: Vec<(ServiceKey, ServiceEntry)>,
    behaviors: Vec<BehaviorRegistration>,
}

impl HandlerRegistryBuilder {
    /// Registers the single handler for `R`.
    #[must_use]
    pub fn handler<R, H>(mut self, handler: H) -> Self
    where
        R: Request,
        H: RequestHandler<R>,
    {
        let handler: Arc<dyn RequestHandler<R>> = Arc::new(handler);
        self.handlers.push(HandlerRegistration {
            key: ServiceKey::handler::<R>(),
            request_type: std::any::type_name::<R>(),
            entry: Arc::new(handler),
            install: install_chain::<R>,
        });
        self
    }

    /// Registers a validator for `R`. A request type may have any number.
    #[must_use]
    pub fn validator<R, V>(mut self, validator: V) -> Self
    where
        R: Request,
        V: Validator<R>,
    {
        let validator: Arc<dyn Validator<R>> = Arc::new(validator);
        self.validators
            .push((ServiceKey::validator::<R>(), Arc::new(validator)));
        self
    }

    /// Registers a behavior that wraps only `R`'s handler.
    #[must_use]
    pub fn behavior<R, B>(mut self, behavior: B) -> Self
    where
        R: Request,
        B: PipelineBehavior<R>,
    {
        let behavior: Arc<dyn PipelineBehavior<R>> = Arc::new(behavior);
        self.behaviors.push(BehaviorRegistration::Specific {
            request: TypeId::of::<R>(),
            entry: Arc::new(behavior),
        });
        self
    }

    /// Registers the built-in behaviors enabled in `config`, in the order
    /// logging, performance, validation.
    ///
    /// Validation is only installed for request types that have validators.
    #[must_use]
    pub fn with_config(mut self, config: &MediatorConfig) -> Self {
        if config.enable_logging {
            self.behaviors
                .push(BehaviorRegistration::Standard(StandardBehavior::Logging));
        }
        if config.enable_performance {
            self.behaviors
                .push(BehaviorRegistration::Standard(StandardBehavior::Performance(
                    config.slow_request_threshold(),
                )));
        }
        if config.enable_validation {
            self.behaviors
                .push(BehaviorRegistration::Standard(StandardBehavior::Validation));
        }
        self
    }

    /// Assembles the registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateHandler`] if two handlers were
    /// registered for the same request type.
    pub fn build(self) -> Result<HandlerRegistry, RegistryError> {
        let mut registry = HandlerRegistry::default();

        for (key, entry) in self.validators {
            registry.multi.entry(key).or_default().push(entry);
        }

        let mut installers = Vec::with_capacity(self.handlers.len());
        for registration in self.handlers {
            if registry.single.contains_key(&registration.key) {
                return Err(RegistryError::DuplicateHandler {
                    request_type: registration.request_type,
                });
            }
            registry.single.insert(registration.key, registration.entry);
            installers.push(registration.install);
        }

        for install in installers {
            install(&self.behaviors, &mut registry);
        }

        Ok(registry)
    }
}

fn install_chain<R: Request>(behaviors: &[BehaviorRegistration], registry: &mut HandlerRegistry) {
    let validators = registry.validators_for::<R>();
    let mut chain: Vec<ServiceEntry> = Vec::new();

    for registration in behaviors {
        let behavior: Arc<dyn PipelineBehavior<R>> = match registration {
            BehaviorRegistration::Standard(StandardBehavior::Logging) => Arc::new(LoggingBehavior),
            BehaviorRegistration::Standard(StandardBehavior::Performance(threshold)) => {
                Arc::new(PerformanceBehavior::new(*threshold))
            }
            BehaviorRegistration::Standard(StandardBehavior::Validation) => {
                if validators.is_empty() {
                    continue;
                }
                Arc::new(ValidationBehavior::new(validators.clone()))
            }
            BehaviorRegistration::Specific { request, entry } => {
                if *request != TypeId::of::<R>() {
                    continue;
                }
                chain.push(Arc::clone(entry));
                continue;
            }
        };
        chain.push(Arc::new(behavior));
    }

    registry.multi.insert(ServiceKey::behavior::<R>(), chain);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use courier_core::{Outcome, ValidationResult};
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::context::RequestContext;
    use crate::pipeline::Next;

    struct Ping;

    impl Request for Ping {
        type Response = Outcome<&'static str>;
    }

    struct Pong;

    impl Request for Pong {
        type Response = Outcome;
    }

    struct PingHandler;

    #[async_trait]
    impl RequestHandler<Ping> for PingHandler {
        async fn handle(
            &self,
            _request: &Ping,
            _cancellation: CancellationToken,
        ) -> anyhow::Result<Outcome<&'static str>> {
            Ok(Outcome::success("pong"))
        }
    }

    struct PongHandler;

    #[async_trait]
    impl RequestHandler<Pong> for PongHandler {
        async fn handle(&self, _request: &Pong, _cancellation: CancellationToken) -> anyhow::Result<Outcome> {
            Ok(Outcome::ok())
        }
    }

    struct AlwaysValid;

    impl Validator<Ping> for AlwaysValid {
        fn validate(&self, _request: &Ping) -> ValidationResult {
            ValidationResult::success()
        }
    }

    struct Marker;

    #[async_trait]
    impl PipelineBehavior<Ping> for Marker {
        async fn handle<'a>(
            &self,
            _ctx: &'a RequestContext<Ping>,
            next: Next<'a, Outcome<&'static str>>,
        ) -> anyhow::Result<Outcome<&'static str>> {
            next().await
        }
    }

    #[test]
    fn resolves_registered_handler() {
        let registry = HandlerRegistry::builder()
            .handler::<Ping, _>(PingHandler)
            .build()
            .unwrap();
        assert!(registry.contains_handler::<Ping>());
        assert!(!registry.contains_handler::<Pong>());
        assert!(registry.handler_for::<Ping>().is_some());
        assert!(registry.handler_for::<Pong>().is_none());
        assert_eq!(registry.handler_count(), 1);
    }

    #[test]
    fn duplicate_handler_is_rejected() {
        let err = HandlerRegistry::builder()
            .handler::<Ping, _>(PingHandler)
            .handler::<Ping, _>(PingHandler)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateHandler {
                request_type: std::any::type_name::<Ping>()
            }
        );
    }

    #[test]
    fn without_config_chain_is_empty() {
        let registry = HandlerRegistry::builder()
            .handler::<Ping, _>(PingHandler)
            .validator::<Ping, _>(AlwaysValid)
            .build()
            .unwrap();
        assert!(registry.behaviors_for::<Ping>().is_empty());
        assert_eq!(registry.validators_for::<Ping>().len(), 1);
    }

    #[test]
    fn validation_installed_only_where_validators_exist() {
        let registry = HandlerRegistry::builder()
            .with_config(&MediatorConfig::default())
            .handler::<Ping, _>(PingHandler)
            .handler::<Pong, _>(PongHandler)
            .validator::<Ping, _>(AlwaysValid)
            .build()
            .unwrap();
        assert_eq!(registry.behaviors_for::<Ping>().len(), 3);
        assert_eq!(registry.behaviors_for::<Pong>().len(), 2);
    }

    #[test]
    fn disabled_standard_behaviors_are_skipped() {
        let config = MediatorConfig {
            enable_logging: false,
            enable_performance: false,
            ..MediatorConfig::default()
        };
        let registry = HandlerRegistry::builder()
            .with_config(&config)
            .handler::<Pong, _>(PongHandler)
            .build()
            .unwrap();
        assert!(registry.behaviors_for::<Pong>().is_empty());
    }

    #[test]
    fn specific_behavior_only_wraps_its_request() {
        let registry = HandlerRegistry::builder()
            .handler::<Ping, _>(PingHandler)
            .handler::<Pong, _>(PongHandler)
            .behavior::<Ping, _>(Marker)
            .build()
            .unwrap();
        assert_eq!(registry.behaviors_for::<Ping>().len(), 1);
        assert!(registry.behaviors_for::<Pong>().is_empty());
    }
}
