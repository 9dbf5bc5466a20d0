//! Behavior chain composed around handler invocation.

mod behavior;
pub mod behaviors;
mod executor;

pub use behavior::{delegate, handler_delegate, BoxFuture, Next, PipelineBehavior};
pub use executor::PipelineExecutor;
