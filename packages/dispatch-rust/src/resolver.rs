//! Type-erased lookup of handlers, behaviors and validators.
//!
//! The mediator only ever talks to a [`HandlerResolver`]; everything behind it
//! is keyed by [`TypeId`] and stored as `Arc<dyn Any>`. [`ResolverExt`]
//! restores the static types at the call site.

use std::any::{Any, TypeId};
use std::sync::Arc;

use courier_core::{Request, RequestHandler, Validator};

use crate::pipeline::PipelineBehavior;

/// A resolved service, boxed as `Any`.
///
/// Handlers are stored as `Arc<dyn RequestHandler<R>>`, behaviors as
/// `Arc<dyn PipelineBehavior<R>>` and validators as `Arc<dyn Validator<R>>`,
/// each wrapped once more in this `Arc`.
pub type ServiceEntry = Arc<dyn Any + Send + Sync>;

/// What a resolved service does for its request type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceRole {
    Handler,
    Behavior,
    Validator,
}

/// Lookup key: role plus the request and (for handlers) response types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceKey {
    pub role: ServiceRole,
    pub request: TypeId,
    pub response: Option<TypeId>,
}

impl ServiceKey {
    #[must_use]
    pub fn handler<R: Request>() -> Self {
        Self {
            role: ServiceRole::Handler,
            request: TypeId::of::<R>(),
            response: Some(TypeId::of::<R::Response>()),
        }
    }

    #[must_use]
    pub fn behavior<R: Request>() -> Self {
        Self {
            role: ServiceRole::Behavior,
            request: TypeId::of::<R>(),
            response: Some(TypeId::of::<R::Response>()),
        }
    }

    #[must_use]
    pub fn validator<R: Request>() -> Self {
        Self {
            role: ServiceRole::Validator,
            request: TypeId::of::<R>(),
            response: None,
        }
    }
}

/// Source of handlers, behaviors and validators for the mediator.
///
/// Implementations must be immutable once shared: the mediator resolves on
/// every dispatch from many tasks at once.
pub trait HandlerResolver: Send + Sync {
    /// The single service under `key`, if any.
    fn resolve(&self, key: &ServiceKey) -> Option<ServiceEntry>;

    /// All services under `key` in registration order.
    fn resolve_all(&self, key: &ServiceKey) -> Vec<ServiceEntry>;
}

/// Typed lookups over any [`HandlerResolver`].
///
/// Entries whose stored type does not match the key are skipped.
pub trait ResolverExt {
    fn handler_for<R: Request>(&self) -> Option<Arc<dyn RequestHandler<R>>>;
    fn behaviors_for<R: Request>(&self) -> Vec<Arc<dyn PipelineBehavior<R>>>;
    fn validators_for<R: Request>(&self) -> Vec<Arc<dyn Validator<R>>>;
}

impl<T: HandlerResolver + ?Sized> ResolverExt for T {
    fn handler_for<R: Request>(&self) -> Option<Arc<dyn RequestHandler<R>>> {
        self.resolve(&ServiceKey::handler::<R>())
            .and_then(|entry| entry.downcast_ref::<Arc<dyn RequestHandler<R>>>().cloned())
    }

    fn behaviors_for<R: Request>(&self) -> Vec<Arc<dyn PipelineBehavior<R>>> {
        downcast_all(self.resolve_all(&ServiceKey::behavior::<R>()))
    }

    fn validators_for<R: Request>(&self) -> Vec<Arc<dyn Validator<R>>> {
        downcast_all(self.resolve_all(&ServiceKey::validator::<R>()))
    }
}

fn downcast_all<T: Clone + 'static>(entries: Vec<ServiceEntry>) -> Vec<T> {
    entries
        .iter()
        .filter_map(|entry| entry.downcast_ref::<T>().cloned())
        .collect()
}
