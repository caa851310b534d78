//! Helpers for futures whose value is itself a container, so callers can map the inner
//! value without unpacking it by hand.

use crate::functional::{Either, Try};
use crate::future::future::Future;

impl<A: Send + Sync + 'static> Future<Option<A>> {
    /// Map the value inside a successful `Some`.
    pub fn map_t<B, F>(&self, f: F) -> Future<Option<B>>
    where
        B: Send + Sync + 'static,
        F: FnOnce(&A) -> B + Send + 'static,
    {
        self.map(move |option| option.as_ref().map(f))
    }

    /// Chain a step that only runs for `Some`; `None` short-circuits.
    pub fn flat_map_t<B, F>(&self, f: F) -> Future<Option<B>>
    where
        B: Clone + Send + Sync + 'static,
        F: FnOnce(&A) -> Future<Option<B>> + Send + 'static,
    {
        self.flat_map(move |option| match option {
            Some(value) => f(value),
            None => Future::successful(None),
        })
    }
}

impl<L, R> Future<Either<L, R>>
where
    L: Clone + Send + Sync + 'static,
    R: Send + Sync + 'static,
{
    /// Map the value inside a successful `Right`.
    pub fn map_t<RR, F>(&self, f: F) -> Future<Either<L, RR>>
    where
        RR: Send + Sync + 'static,
        F: FnOnce(&R) -> RR + Send + 'static,
    {
        self.map(move |either| match either {
            Either::Left(left) => Either::Left(left.clone()),
            Either::Right(right) => Either::Right(f(right)),
        })
    }

    /// Chain a step that only runs for `Right`; `Left` short-circuits.
    pub fn flat_map_t<RR, F>(&self, f: F) -> Future<Either<L, RR>>
    where
        RR: Clone + Send + Sync + 'static,
        F: FnOnce(&R) -> Future<Either<L, RR>> + Send + 'static,
    {
        self.flat_map(move |either| match either {
            Either::Left(left) => Future::successful(Either::Left(left.clone())),
            Either::Right(right) => f(right),
        })
    }
}

impl<A: Send + Sync + 'static> Future<Try<A>> {
    /// Map the value inside a successful inner `Try`.
    pub fn map_t<B, F>(&self, f: F) -> Future<Try<B>>
    where
        B: Send + Sync + 'static,
        F: FnOnce(&A) -> B + Send + 'static,
    {
        self.map(move |attempt| attempt.as_ref().map(f))
    }

    /// Chain a step that only runs for an inner success; an inner failure short-circuits.
    pub fn flat_map_t<B, F>(&self, f: F) -> Future<Try<B>>
    where
        B: Clone + Send + Sync + 'static,
        F: FnOnce(&A) -> Future<Try<B>> + Send + 'static,
    {
        self.flat_map(move |attempt| match attempt {
            Try::Success(value) => f(value),
            Try::Failure(error) => Future::successful(Try::Failure(error.clone())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RxError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn option_transformers_skip_none() {
        let found = Future::successful(Some(2)).map_t(|n| n + 1);
        assert_eq!(found.value(), Some(Try::Success(Some(3))));

        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();
        let missing = Future::successful(None::<i32>).flat_map_t(move |n| {
            called_clone.store(true, Ordering::SeqCst);
            Future::successful(Some(*n))
        });
        assert_eq!(missing.value(), Some(Try::Success(None)));
        assert!(!called.load(Ordering::SeqCst));
    }

    #[test]
    fn either_transformers_are_right_biased() {
        let right: Future<Either<String, i32>> = Future::successful(Either::Right(4));
        let doubled = right.map_t(|n| n * 2);
        assert_eq!(doubled.value(), Some(Try::Success(Either::Right(8))));

        let left: Future<Either<String, i32>> =
            Future::successful(Either::Left("no user".to_string()));
        let chained = left.flat_map_t(|n| Future::successful(Either::Right(n.to_string())));
        assert_eq!(
            chained.value(),
            Some(Try::Success(Either::Left("no user".to_string())))
        );
    }

    #[test]
    fn try_transformers_keep_inner_failure() {
        let inner_failure = Future::successful(Try::<i32>::Failure(RxError::msg("parse")));
        let chained = inner_failure.flat_map_t(|n| Future::successful(Try::Success(n + 1)));
        assert_eq!(
            chained.value(),
            Some(Try::Success(Try::Failure(RxError::msg("parse"))))
        );

        let mapped = Future::successful(Try::Success(1)).map_t(|n| n * 10);
        assert_eq!(mapped.value(), Some(Try::Success(Try::Success(10))));
    }
}
