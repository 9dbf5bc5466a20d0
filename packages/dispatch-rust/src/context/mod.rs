//! Per-dispatch request context.
//!
//! A [`RequestContext`] is created exactly once per dispatch by a
//! [`RequestContextFactory`], owned by the [`Mediator`](crate::Mediator) for
//! the duration of the call and lent by shared reference to every behavior.
//! Behaviors mutate it only through [`RequestContext::add_item`],
//! [`RequestContext::remove_item`] and [`RequestContext::set_finished_at`].

mod factory;
mod items;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use courier_core::{ClockSource, Request};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub use factory::{ContextFactoryExt, DefaultContextFactory, RequestContextFactory};
pub use items::ItemValue;

use crate::error::MediatorError;
use crate::short_type_name;
use items::ContextItems;

/// Request-independent part of a context, produced by a
/// [`RequestContextFactory`] when a dispatch starts.
#[derive(Clone)]
pub struct ContextHeader {
    pub request_id: Uuid,
    pub correlation_id: Uuid,
    pub user_id: String,
    /// Start time in milliseconds since Unix epoch.
    pub started_at: u64,
    /// Clock used for [`RequestContext::duration`] and
    /// [`RequestContext::mark_finished`].
    pub clock: Arc<dyn ClockSource>,
}

impl fmt::Debug for ContextHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextHeader")
            .field("request_id", &self.request_id)
            .field("correlation_id", &self.correlation_id)
            .field("user_id", &self.user_id)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

/// Per-invocation record threaded through the behavior chain and handler.
pub struct RequestContext<R: Request> {
    request_id: Uuid,
    correlation_id: Uuid,
    user_id: String,
    started_at: u64,
    finished_at: Mutex<Option<u64>>,
    request: R,
    cancellation: CancellationToken,
    items: ContextItems,
    clock: Arc<dyn ClockSource>,
}

impl<R: Request> RequestContext<R> {
    #[must_use]
    pub fn new(header: ContextHeader, request: R, cancellation: CancellationToken) -> Self {
        Self {
            request_id: header.request_id,
            correlation_id: header.correlation_id,
            user_id: header.user_id,
            started_at: header.started_at,
            finished_at: Mutex::new(None),
            request,
            cancellation,
            items: ContextItems::default(),
            clock: header.clock,
        }
    }

    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    #[must_use]
    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    #[must_use]
    pub fn started_at(&self) -> u64 {
        self.started_at
    }

    /// Completion time, unset until the dispatch (or a behavior) records it.
    #[must_use]
    pub fn finished_at(&self) -> Option<u64> {
        *self.finished_at.lock()
    }

    pub fn set_finished_at(&self, millis: u64) {
        *self.finished_at.lock() = Some(millis);
    }

    /// Records the current clock time as the finish time unless one is
    /// already set, and returns the finish time in effect.
    pub fn mark_finished(&self) -> u64 {
        *self
            .finished_at
            .lock()
            .get_or_insert_with(|| self.clock.now())
    }

    /// `finished_at - started_at` once finished, otherwise time elapsed so far.
    #[must_use]
    pub fn duration(&self) -> Duration {
        let end = self.finished_at().unwrap_or_else(|| self.clock.now());
        Duration::from_millis(end.saturating_sub(self.started_at))
    }

    #[must_use]
    pub fn request(&self) -> &R {
        &self.request
    }

    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Fully qualified name of the concrete request type.
    #[must_use]
    pub fn request_type(&self) -> &'static str {
        std::any::type_name::<R>()
    }

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`MediatorError::InvalidArgument`] if `key` is blank.
    pub fn add_item<T: std::any::Any + Send + Sync>(
        &self,
        key: &str,
        value: T,
    ) -> Result<(), MediatorError> {
        self.items.insert(key, value)
    }

    /// Returns the item under `key` if present and of type `T`.
    #[must_use]
    pub fn try_get_item<T: std::any::Any + Clone>(&self, key: &str) -> Option<T> {
        self.items.get(key)
    }

    /// Removes `key`, returning whether it was present.
    pub fn remove_item(&self, key: &str) -> bool {
        self.items.remove(key)
    }

    /// Read-only copy of all items in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<(String, ItemValue)> {
        self.items.snapshot()
    }
}

impl<R: Request> fmt::Debug for RequestContext<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_type", &short_type_name::<R>())
            .field("request_id", &self.request_id)
            .field("correlation_id", &self.correlation_id)
            .field("user_id", &self.user_id)
            .field("started_at", &self.started_at)
            .field("finished_at", &self.finished_at())
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}
