//! Typed error values carried by failed [`Outcome`](crate::Outcome)s.
//!
//! An [`Error`] is data, not a Rust error to be propagated with `?`: handlers
//! return it inside an `Outcome` to describe an expected business failure
//! (not found, conflict, validation, ...). The distinguished [`Error::NONE`]
//! value means "no error" and is the only error a successful outcome carries.

use serde::{Deserialize, Serialize};

/// Classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Generic failure. Also the kind of [`Error::NONE`].
    #[default]
    Failure,
    /// One or more request properties failed validation.
    Validation,
    /// Unexpected problem while processing an otherwise valid request.
    Problem,
    /// The addressed entity does not exist.
    NotFound,
    /// The request conflicts with the current state.
    Conflict,
    /// The caller is not allowed to perform the request.
    Unauthorized,
}

/// Structured error with a stable code, a human-readable message and a kind.
///
/// `details` is empty for plain errors. Aggregating errors (see
/// [`ValidationError`]) store their children there.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct Error {
    code: String,
    message: String,
    kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    details: Vec<Error>,
}

/// Shared instance backing [`Error::none_ref`].
static NONE: Error = Error::NONE;

impl Error {
    /// The "no error" sentinel: empty code, empty message, kind `Failure`.
    pub const NONE: Error = Error {
        code: String::new(),
        message: String::new(),
        kind: ErrorKind::Failure,
        details: Vec::new(),
    };

    /// Code of the error produced when an absent value is lifted into an outcome.
    pub const NULL_VALUE_CODE: &'static str = "General.Null";

    /// Creates an error of the given kind.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            kind,
            details: Vec::new(),
        }
    }

    /// Error used when a null or missing value is lifted into an outcome.
    #[must_use]
    pub fn null_value() -> Self {
        Self::new(Self::NULL_VALUE_CODE, "Null value was provided", ErrorKind::Failure)
    }

    #[must_use]
    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, message, ErrorKind::Failure)
    }

    #[must_use]
    pub fn validation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, message, ErrorKind::Validation)
    }

    #[must_use]
    pub fn problem(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, message, ErrorKind::Problem)
    }

    #[must_use]
    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, message, ErrorKind::NotFound)
    }

    #[must_use]
    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, message, ErrorKind::Conflict)
    }

    #[must_use]
    pub fn unauthorized(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, message, ErrorKind::Unauthorized)
    }

    /// Borrowed [`Error::NONE`] with a `'static` lifetime.
    #[must_use]
    pub fn none_ref() -> &'static Error {
        &NONE
    }

    /// Returns `true` if this is the [`Error::NONE`] sentinel.
    #[must_use]
    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Child errors of an aggregating error. Empty for plain errors.
    #[must_use]
    pub fn details(&self) -> &[Error] {
        &self.details
    }
}

impl Default for Error {
    fn default() -> Self {
        Self::NONE
    }
}

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// Aggregate of zero or more child errors raised while validating a request.
///
/// Always carries code [`ValidationError::CODE`], message
/// [`ValidationError::MESSAGE`] and kind [`ErrorKind::Validation`]. Converts
/// into a plain [`Error`] whose `details` are the children, so it can be
/// wrapped in a failed outcome like any other error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationError {
    errors: Vec<Error>,
}

impl ValidationError {
    pub const CODE: &'static str = "Validation.General";
    pub const MESSAGE: &'static str = "One or more validation errors occurred";

    #[must_use]
    pub fn new(errors: Vec<Error>) -> Self {
        Self { errors }
    }

    /// Collects the errors of every failed outcome in `outcomes`.
    pub fn from_outcomes<'a, V: 'a, I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = &'a crate::Outcome<V>>,
    {
        Self::new(
            outcomes
                .into_iter()
                .filter(|outcome| outcome.is_failure())
                .map(|outcome| outcome.error().clone())
                .collect(),
        )
    }

    #[must_use]
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl From<ValidationError> for Error {
    fn from(value: ValidationError) -> Self {
        Error {
            code: ValidationError::CODE.to_string(),
            message: ValidationError::MESSAGE.to_string(),
            kind: ErrorKind::Validation,
            details: value.errors,
        }
    }
}
