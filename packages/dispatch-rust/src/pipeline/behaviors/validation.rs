use std::any::type_name;
use std::sync::Arc;

use async_trait::async_trait;
use courier_core::{Error, Request, ResponseShape, ValidationError, Validator};

use crate::context::RequestContext;
use crate::error::BehaviorError;
use crate::pipeline::{Next, PipelineBehavior};
use crate::short_type_name;

/// Runs every validator registered for `R` before the rest of the chain.
///
/// Any property failure short-circuits: `next` is never called and the
/// failures come back as a validation-failed response. Response types that
/// cannot represent that failure yield
/// [`BehaviorError::UnsupportedResponseType`].
pub struct ValidationBehavior<R: Request> {
    validators: Vec<Arc<dyn Validator<R>>>,
}

impl<R: Request> ValidationBehavior<R> {
    #[must_use]
    pub fn new(validators: Vec<Arc<dyn Validator<R>>>) -> Self {
        Self { validators }
    }

    /// Collects one validation [`Error`] per failing property, in validator
    /// order.
    fn collect_failures(&self, request: &R) -> Vec<Error> {
        let request_type = short_type_name::<R>();
        self.validators
            .iter()
            .map(|validator| validator.validate(request))
            .filter(|result| !result.is_valid())
            .flat_map(courier_core::ValidationResult::into_errors)
            .map(|failure| {
                Error::validation(
                    format!("Validation.{request_type}.{}", failure.property_name),
                    failure.to_string(),
                )
            })
            .collect()
    }
}

impl<R: Request> std::fmt::Debug for ValidationBehavior<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationBehavior")
            .field("request_type", &short_type_name::<R>())
            .field("validators", &self.validators.len())
            .finish()
    }
}

#[async_trait]
impl<R: Request> PipelineBehavior<R> for ValidationBehavior<R> {
    async fn handle<'a>(
        &self,
        ctx: &'a RequestContext<R>,
        next: Next<'a, R::Response>,
    ) -> anyhow::Result<R::Response> {
        let failures = self.collect_failures(ctx.request());
        if failures.is_empty() {
            return next().await;
        }

        tracing::debug!(
            request_type = short_type_name::<R>(),
            request_id = %ctx.request_id(),
            failures = failures.len(),
            "request failed validation"
        );

        let error = ValidationError::new(failures);
        <R::Response as ResponseShape>::from_validation_error(error).ok_or_else(|| {
            BehaviorError::UnsupportedResponseType {
                request_type: type_name::<R>(),
                response_type: type_name::<R::Response>(),
            }
            .into()
        })
    }
}
