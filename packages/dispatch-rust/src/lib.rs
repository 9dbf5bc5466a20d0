//! Courier: in-process mediator dispatching typed requests to their single
//! handler through an ordered chain of pipeline behaviors.
//!
//! ```no_run
//! use async_trait::async_trait;
//! use courier::{HandlerRegistry, Mediator, MediatorConfig};
//! use courier_core::{Outcome, Request, RequestHandler};
//! use tokio_util::sync::CancellationToken;
//!
//! struct Ping;
//!
//! impl Request for Ping {
//!     type Response = Outcome<&'static str>;
//! }
//!
//! struct PingHandler;
//!
//! #[async_trait]
//! impl RequestHandler<Ping> for PingHandler {
//!     async fn handle(&self, _: &Ping, _: CancellationToken) -> anyhow::Result<Outcome<&'static str>> {
//!         Ok(Outcome::success("pong"))
//!     }
//! }
//!
//! # async fn run() -> anyhow::Result<()> {
//! let registry = HandlerRegistry::builder()
//!     .with_config(&MediatorConfig::default())
//!     .handler::<Ping, _>(PingHandler)
//!     .build()?;
//! let mediator = Mediator::builder().registry(registry).build();
//! assert_eq!(*mediator.send(Ping).await?.value(), "pong");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod mediator;
pub mod pipeline;
pub mod registry;
pub mod resolver;
pub mod service;
pub mod telemetry;

pub use courier_core;

pub use config::MediatorConfig;
pub use context::{
    ContextFactoryExt, ContextHeader, DefaultContextFactory, RequestContext, RequestContextFactory,
};
pub use error::{BehaviorError, MediatorError, RegistryError};
pub use mediator::{BoxedRequest, DynRequest, Mediator, MediatorBuilder};
pub use pipeline::behaviors::{LoggingBehavior, PerformanceBehavior, ValidationBehavior};
pub use pipeline::{Next, PipelineBehavior, PipelineExecutor};
pub use registry::{HandlerRegistry, HandlerRegistryBuilder};
pub use resolver::{HandlerResolver, ResolverExt, ServiceKey, ServiceRole};
pub use service::MediatorService;

/// Type name without module path or generic arguments, e.g. `CreateUser` for
/// `app::users::CreateUser<T>`.
#[must_use]
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    mod nested {
        pub struct Wrapper<T>(pub T);
    }

    #[test]
    fn short_type_name_strips_path_and_generics() {
        assert_eq!(short_type_name::<nested::Wrapper<String>>(), "Wrapper");
        assert_eq!(short_type_name::<u32>(), "u32");
        assert_eq!(short_type_name::<MediatorConfig>(), "MediatorConfig");
    }
}
