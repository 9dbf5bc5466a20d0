//! Success/failure envelope returned by every handler and behavior.
//!
//! [`Outcome<V>`] is either a success carrying a `V` or a failure carrying
//! exactly one non-[`NONE`](Error::NONE) [`Error`]. The representation is
//! private: the only ways to build one are the constructors below, which
//! reject the two illegal states (a success with an error, a failure
//! without one).

use crate::error::{Error, ValidationError};

/// Violations of the outcome construction invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OutcomeError {
    #[error("a successful outcome cannot have an error")]
    SuccessWithError,
    #[error("a failure outcome must have an error")]
    FailureWithoutError,
    #[error("the value of a failure outcome can't be accessed")]
    ValueOfFailure,
}

#[derive(Debug, Clone, PartialEq)]
enum Repr<V> {
    Success(V),
    Failure(Error),
}

/// Tagged success/failure container.
///
/// `Outcome` (with the default `V = ()`) is the valueless form returned by
/// commands that only report whether they succeeded.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct Outcome<V = ()> {
    repr: Repr<V>,
}

impl Outcome<()> {
    /// Valueless success.
    pub fn ok() -> Self {
        Self::success(())
    }
}

impl<V> Outcome<V> {
    /// Success carrying `value`.
    pub fn success(value: V) -> Self {
        Self {
            repr: Repr::Success(value),
        }
    }

    /// Failure carrying `error`.
    ///
    /// # Panics
    ///
    /// Panics if `error` is [`Error::NONE`]. Use [`Outcome::new`] to check the
    /// invariant without panicking.
    pub fn failure(error: Error) -> Self {
        assert!(!error.is_none(), "{}", OutcomeError::FailureWithoutError);
        Self {
            repr: Repr::Failure(error),
        }
    }

    /// Failure produced by request validation.
    pub fn validation_failure(error: ValidationError) -> Self {
        Self {
            repr: Repr::Failure(error.into()),
        }
    }

    /// Builds an outcome from its parts, checking the construction invariants.
    ///
    /// A success with an absent `value` lifts to a failure carrying
    /// [`Error::null_value`].
    ///
    /// # Errors
    ///
    /// Returns [`OutcomeError::SuccessWithError`] if `is_success` is set and
    /// `error` is not [`Error::NONE`], and [`OutcomeError::FailureWithoutError`]
    /// if `is_success` is clear and `error` is [`Error::NONE`].
    pub fn new(is_success: bool, value: Option<V>, error: Error) -> Result<Self, OutcomeError> {
        match (is_success, error.is_none()) {
            (true, false) => Err(OutcomeError::SuccessWithError),
            (false, true) => Err(OutcomeError::FailureWithoutError),
            (true, true) => Ok(value.into()),
            (false, false) => Ok(Self {
                repr: Repr::Failure(error),
            }),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.repr, Repr::Success(_))
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// The failure's error, or [`Error::NONE`] for a success.
    #[must_use]
    pub fn error(&self) -> &Error {
        match &self.repr {
            Repr::Success(_) => Error::none_ref(),
            Repr::Failure(error) => error,
        }
    }

    /// The success value.
    ///
    /// # Panics
    ///
    /// Panics on a failure: reading the value of a failed outcome is a
    /// programming error. Use [`Outcome::try_value`] to branch instead.
    #[must_use]
    pub fn value(&self) -> &V {
        match &self.repr {
            Repr::Success(value) => value,
            Repr::Failure(_) => panic!("{}", OutcomeError::ValueOfFailure),
        }
    }

    /// The success value, or [`OutcomeError::ValueOfFailure`].
    ///
    /// # Errors
    ///
    /// Returns [`OutcomeError::ValueOfFailure`] if this outcome is a failure.
    pub fn try_value(&self) -> Result<&V, OutcomeError> {
        match &self.repr {
            Repr::Success(value) => Ok(value),
            Repr::Failure(_) => Err(OutcomeError::ValueOfFailure),
        }
    }

    /// Converts into a standard `Result`.
    ///
    /// # Errors
    ///
    /// Returns the carried [`Error`] if this outcome is a failure.
    pub fn into_result(self) -> Result<V, Error> {
        match self.repr {
            Repr::Success(value) => Ok(value),
            Repr::Failure(error) => Err(error),
        }
    }

    /// Maps the success value, leaving a failure untouched.
    pub fn map<U, F: FnOnce(V) -> U>(self, f: F) -> Outcome<U> {
        match self.repr {
            Repr::Success(value) => Outcome::success(f(value)),
            Repr::Failure(error) => Outcome {
                repr: Repr::Failure(error),
            },
        }
    }
}

impl<V> From<Error> for Outcome<V> {
    /// # Panics
    ///
    /// Panics if `error` is [`Error::NONE`].
    fn from(error: Error) -> Self {
        Self::failure(error)
    }
}

impl<V> From<ValidationError> for Outcome<V> {
    fn from(error: ValidationError) -> Self {
        Self::validation_failure(error)
    }
}

impl<V> From<Option<V>> for Outcome<V> {
    /// `Some(v)` lifts to a success, `None` to a failure with [`Error::null_value`].
    fn from(value: Option<V>) -> Self {
        match value {
            Some(value) => Self::success(value),
            None => Self::failure(Error::null_value()),
        }
    }
}

// ---------------------------------------------------------------------------
// ResponseShape
// ---------------------------------------------------------------------------

/// Bound on request response types describing whether a response can carry
/// a validation failure.
///
/// Every [`Outcome<V>`] can, and returns `Some`. Other response types keep
/// the default `None`, which the validation behavior reports as an
/// unsupported response type instead of inventing a value.
///
/// Custom response types opt in with an empty impl:
///
/// ```
/// use courier_core::ResponseShape;
///
/// struct Receipt {
///     id: u64,
/// }
///
/// impl ResponseShape for Receipt {}
/// ```
pub trait ResponseShape: Send + 'static {
    /// Builds the failed response for `error`, or `None` if this type has no
    /// failure representation.
    fn from_validation_error(error: ValidationError) -> Option<Self>
    where
        Self: Sized,
    {
        drop(error);
        None
    }
}

impl<V: Send + 'static> ResponseShape for Outcome<V> {
    fn from_validation_error(error: ValidationError) -> Option<Self> {
        Some(Self::validation_failure(error))
    }
}

macro_rules! plain_response {
    ($($ty:ty),* $(,)?) => {
        $(impl ResponseShape for $ty {})*
    };
}

plain_response!((), bool, char, String, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

impl<T: Send + 'static> ResponseShape for Vec<T> {}
impl<T: Send + 'static> ResponseShape for Option<T> {}
