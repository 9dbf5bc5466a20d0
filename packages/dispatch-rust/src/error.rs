//! Error types surfaced by the dispatcher, the pipeline and the registry.

/// The three ways a dispatch can fail.
///
/// Expected business failures are not errors: they travel back as failed
/// [`Outcome`](courier_core::Outcome)s inside `Ok`.
#[derive(Debug, thiserror::Error)]
pub enum MediatorError {
    /// An argument the type system cannot rule out was invalid.
    #[error("invalid argument `{argument}`: {reason}")]
    InvalidArgument {
        argument: &'static str,
        reason: &'static str,
    },
    /// No handler is registered for the request type.
    #[error("no handler found for request type '{request_type}'")]
    HandlerNotFound { request_type: &'static str },
    /// Context creation, a behavior or the handler failed. `source` is the
    /// original failure.
    #[error("error while handling request {request_type}")]
    RequestHandling {
        request_type: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl MediatorError {
    /// Wraps `source` as a handling failure of `request_type`.
    #[must_use]
    pub fn handling(request_type: &'static str, source: anyhow::Error) -> Self {
        Self::RequestHandling {
            request_type,
            source,
        }
    }

    /// Returns `true` for [`MediatorError::HandlerNotFound`].
    #[must_use]
    pub fn is_handler_not_found(&self) -> bool {
        matches!(self, Self::HandlerNotFound { .. })
    }
}

/// Configuration errors raised from inside a behavior.
///
/// These are programming errors in how the pipeline was assembled, not
/// request failures, so they are raised as errors rather than folded into a
/// failed outcome.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BehaviorError {
    #[error("validation failed for {request_type} and response type {response_type} cannot carry a validation failure")]
    UnsupportedResponseType {
        request_type: &'static str,
        response_type: &'static str,
    },
}

/// Errors detected while building a [`HandlerRegistry`](crate::HandlerRegistry).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("more than one handler registered for request type '{request_type}'")]
    DuplicateHandler { request_type: &'static str },
}
