//! Built-in behaviors installed from [`MediatorConfig`](crate::MediatorConfig).

mod logging;
mod performance;
mod validation;

pub use logging::LoggingBehavior;
pub use performance::PerformanceBehavior;
pub use validation::ValidationBehavior;
