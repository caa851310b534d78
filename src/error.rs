//! Error type shared by every reactive primitive.

use std::any::Any;
use std::sync::Arc;

use thiserror::Error;

/// Result alias used across the crate.
pub type RxResult<T> = Result<T, RxError>;

/// Failures and protocol misuse reported by observables, promises and the value types.
///
/// The enum is `Clone` so a single failure can be handed to every continuation waiting
/// on the same [`Future`](crate::Future).
#[derive(Debug, Clone, Error)]
pub enum RxError {
    /// A value or finish event was sent to a source that already finished.
    #[error("observable has already finished")]
    Finished,

    /// A promise was completed more than once.
    #[error("promise has already been completed")]
    AlreadyCompleted,

    /// An empty option was accessed as if it held a value.
    #[error("#get on None")]
    EmptyOption,

    /// A user supplied function panicked while computing a value.
    #[error("computation panicked: {0}")]
    Panicked(String),

    /// A failure described only by a message.
    #[error("{0}")]
    Message(String),

    /// Any other error raised by user code.
    #[error("{0}")]
    Other(Arc<dyn std::error::Error + Send + Sync>),
}

impl RxError {
    /// Build a failure from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        RxError::Message(message.into())
    }

    /// Wrap an arbitrary error.
    pub fn other<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        RxError::Other(Arc::new(error))
    }

    /// Convert a panic payload captured by `catch_unwind` into a failure.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        RxError::Panicked(message)
    }

    /// Whether this error reports misuse of a source or promise rather than a failed
    /// computation.
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            RxError::Finished | RxError::AlreadyCompleted | RxError::EmptyOption
        )
    }
}

impl PartialEq for RxError {
    /// Errors compare by variant and message; wrapped errors compare by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RxError::Finished, RxError::Finished)
            | (RxError::AlreadyCompleted, RxError::AlreadyCompleted)
            | (RxError::EmptyOption, RxError::EmptyOption) => true,
            (RxError::Panicked(a), RxError::Panicked(b)) => a == b,
            (RxError::Message(a), RxError::Message(b)) => a == b,
            (RxError::Other(a), RxError::Other(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
