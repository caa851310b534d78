use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::error::{RxError, RxResult};
use crate::functional::Either;

/// The outcome of a computation that may fail.
///
/// `map` and `flat_map` run the supplied function under `catch_unwind`, so a panicking
/// mapper turns into a [`Try::Failure`] instead of unwinding through the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Try<A> {
    Success(A),
    Failure(RxError),
}

impl<A> Try<A> {
    /// Run `f`, capturing a panic as a failure.
    ///
    /// ```
    /// use rivulet::Try;
    ///
    /// assert_eq!(Try::attempt(|| 2 + 2), Try::Success(4));
    /// assert!(Try::<i32>::attempt(|| panic!("nope")).is_failure());
    /// ```
    pub fn attempt<F>(f: F) -> Self
    where
        F: FnOnce() -> A,
    {
        match catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => Try::Success(value),
            Err(payload) => Try::Failure(RxError::from_panic(payload)),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Try::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Try::Failure(_))
    }

    /// The successful value, if any.
    pub fn value(&self) -> Option<&A> {
        match self {
            Try::Success(value) => Some(value),
            Try::Failure(_) => None,
        }
    }

    /// The failure, if any.
    pub fn error(&self) -> Option<&RxError> {
        match self {
            Try::Success(_) => None,
            Try::Failure(err) => Some(err),
        }
    }

    pub fn into_value(self) -> Option<A> {
        match self {
            Try::Success(value) => Some(value),
            Try::Failure(_) => None,
        }
    }

    pub fn as_ref(&self) -> Try<&A> {
        match self {
            Try::Success(value) => Try::Success(value),
            Try::Failure(err) => Try::Failure(err.clone()),
        }
    }

    pub fn map<B, F>(self, f: F) -> Try<B>
    where
        F: FnOnce(A) -> B,
    {
        self.flat_map(|a| Try::attempt(|| f(a)))
    }

    pub fn flat_map<B, F>(self, f: F) -> Try<B>
    where
        F: FnOnce(A) -> Try<B>,
    {
        match self {
            Try::Success(a) => match catch_unwind(AssertUnwindSafe(|| f(a))) {
                Ok(next) => next,
                Err(payload) => Try::Failure(RxError::from_panic(payload)),
            },
            Try::Failure(err) => Try::Failure(err),
        }
    }

    pub fn fold<B>(self, on_value: impl FnOnce(A) -> B, on_error: impl FnOnce(RxError) -> B) -> B {
        match self {
            Try::Success(value) => on_value(value),
            Try::Failure(err) => on_error(err),
        }
    }

    /// Recover from a failure with a fallback value.
    pub fn get_or_else(self, fallback: impl FnOnce(RxError) -> A) -> A {
        match self {
            Try::Success(value) => value,
            Try::Failure(err) => fallback(err),
        }
    }

    pub fn into_result(self) -> RxResult<A> {
        match self {
            Try::Success(value) => Ok(value),
            Try::Failure(err) => Err(err),
        }
    }

    pub fn to_either(self) -> Either<RxError, A> {
        match self {
            Try::Success(value) => Either::Right(value),
            Try::Failure(err) => Either::Left(err),
        }
    }
}

impl<A> From<RxResult<A>> for Try<A> {
    fn from(result: RxResult<A>) -> Self {
        match result {
            Ok(value) => Try::Success(value),
            Err(err) => Try::Failure(err),
        }
    }
}

impl<A: fmt::Display> fmt::Display for Try<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Try::Success(value) => write!(f, "Success({value})"),
            Try::Failure(err) => write!(f, "Error({err})"),
        }
    }
}
