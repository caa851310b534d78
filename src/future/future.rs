use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{RxError, RxResult};
use crate::functional::Try;
use crate::future::cell::CompletionCell;
use crate::observable::Observable;
use crate::subject::ReplaySubject;

/// Creates a connected pair of [`Promise`] and [`Future`].
///
/// ```
/// use rivulet::{promise, Try};
///
/// let (promise, future) = promise();
/// let doubled = future.map(|n: &i32| n * 2);
/// assert_eq!(doubled.value(), None);
///
/// promise.complete_success(21).unwrap();
/// assert_eq!(doubled.value(), Some(Try::Success(42)));
/// ```
pub fn promise<A: Send + Sync + 'static>() -> (Promise<A>, Future<A>) {
    let cell = Arc::new(CompletionCell::new());
    (
        Promise {
            cell: Arc::clone(&cell),
        },
        Future { cell },
    )
}

/// The write side of a single-assignment value.
///
/// A promise completes exactly once. Every later attempt is rejected with
/// [`RxError::AlreadyCompleted`] and leaves the stored result untouched. Promises can be
/// cloned and sent to other threads; whichever clone completes first wins.
pub struct Promise<A> {
    cell: Arc<CompletionCell<Try<A>>>,
}

impl<A> Clone for Promise<A> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<A: Send + Sync + 'static> Promise<A> {
    pub fn complete(&self, result: Try<A>) -> RxResult<()> {
        let failed = result.is_failure();
        match self.cell.complete(result) {
            Ok(()) => {
                debug!(failed, "promise completed");
                Ok(())
            }
            Err(_) => {
                warn!("promise completed twice; keeping the first result");
                Err(RxError::AlreadyCompleted)
            }
        }
    }

    pub fn complete_success(&self, value: A) -> RxResult<()> {
        self.complete(Try::Success(value))
    }

    pub fn complete_error(&self, error: RxError) -> RxResult<()> {
        self.complete(Try::Failure(error))
    }

    pub fn is_completed(&self) -> bool {
        self.cell.is_completed()
    }
}

impl<A> fmt::Debug for Promise<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("completed", &self.cell.is_completed())
            .finish()
    }
}

/// The read side of a single-assignment value.
///
/// Continuations registered with [`Future::on_complete`] run exactly once, in registration
/// order, on the thread that completes the promise. A continuation registered after
/// completion runs immediately on the registering thread.
///
/// Failures are carried as [`Try::Failure`]. `map` and `flat_map` never call their function
/// for a failed future, and a function that panics turns into a failed result.
pub struct Future<A> {
    cell: Arc<CompletionCell<Try<A>>>,
}

impl<A> Clone for Future<A> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<A: Send + Sync + 'static> Future<A> {
    pub fn successful(value: A) -> Self {
        Self::completed(Try::Success(value))
    }

    pub fn failed(error: RxError) -> Self {
        Self::completed(Try::Failure(error))
    }

    pub fn completed(result: Try<A>) -> Self {
        Self {
            cell: Arc::new(CompletionCell::completed(result)),
        }
    }

    /// A future that never completes.
    pub fn unfulfilled() -> Self {
        Self {
            cell: Arc::new(CompletionCell::new()),
        }
    }

    /// Create a promise, hand it to `body`, and return its future.
    pub fn with_promise<F: FnOnce(Promise<A>)>(body: F) -> Self {
        let (promise, future) = promise();
        body(promise);
        future
    }

    pub fn on_complete<F>(&self, f: F)
    where
        F: FnOnce(&Try<A>) + Send + 'static,
    {
        self.cell.on_complete(Box::new(f));
    }

    pub fn on_success<F>(&self, f: F)
    where
        F: FnOnce(&A) + Send + 'static,
    {
        self.on_complete(move |result| {
            if let Try::Success(value) = result {
                f(value);
            }
        });
    }

    pub fn on_failure<F>(&self, f: F)
    where
        F: FnOnce(&RxError) + Send + 'static,
    {
        self.on_complete(move |result| {
            if let Try::Failure(error) = result {
                f(error);
            }
        });
    }

    pub fn is_completed(&self) -> bool {
        self.cell.is_completed()
    }

    pub fn map<B, F>(&self, f: F) -> Future<B>
    where
        B: Send + Sync + 'static,
        F: FnOnce(&A) -> B + Send + 'static,
    {
        let (promise, future) = promise();
        self.on_complete(move |result| {
            let _ = promise.complete(result.as_ref().map(f));
        });
        future
    }

    /// Chain an asynchronous step.
    ///
    /// ```
    /// use rivulet::{Future, RxError, Try};
    ///
    /// let failed = Future::<i32>::failed(RxError::msg("offline"));
    /// let next = failed.flat_map(|_| -> Future<i32> { unreachable!() });
    /// assert_eq!(next.value(), Some(Try::Failure(RxError::msg("offline"))));
    /// ```
    pub fn flat_map<B, F>(&self, f: F) -> Future<B>
    where
        B: Clone + Send + Sync + 'static,
        F: FnOnce(&A) -> Future<B> + Send + 'static,
    {
        let (promise, future) = promise();
        self.on_complete(move |result| match result {
            Try::Success(value) => match Try::attempt(|| f(value)) {
                Try::Success(next) => next.on_complete(move |result| {
                    let _ = promise.complete(result.clone());
                }),
                Try::Failure(error) => {
                    let _ = promise.complete_error(error);
                }
            },
            Try::Failure(error) => {
                let _ = promise.complete_error(error.clone());
            }
        });
        future
    }

    /// Both values, once both futures succeed. The first failure wins.
    pub fn zip<B>(&self, other: &Future<B>) -> Future<(A, B)>
    where
        A: Clone,
        B: Clone + Send + Sync + 'static,
    {
        let other = other.clone();
        self.flat_map(move |a| {
            let a = a.clone();
            other.map(move |b| (a, b.clone()))
        })
    }

    /// Turn a failure into a value.
    pub fn recover<F>(&self, f: F) -> Future<A>
    where
        A: Clone,
        F: FnOnce(&RxError) -> A + Send + 'static,
    {
        let (promise, future) = promise();
        self.on_complete(move |result| {
            let recovered = match result {
                Try::Success(value) => Try::Success(value.clone()),
                Try::Failure(error) => Try::attempt(|| f(error)),
            };
            let _ = promise.complete(recovered);
        });
        future
    }
}

impl<A: Clone + Send + Sync + 'static> Future<A> {
    /// The result, if the future has completed.
    pub fn value(&self) -> Option<Try<A>> {
        self.cell.peek().map(|result| (*result).clone())
    }

    /// Block the calling thread until the future completes.
    ///
    /// Meant for worker threads; waiting on the thread that is supposed to complete the
    /// promise never returns.
    pub fn wait(&self) -> Try<A> {
        (*self.cell.wait()).clone()
    }

    pub fn wait_timeout(&self, timeout: Duration) -> Option<Try<A>> {
        self.cell.wait_timeout(timeout).map(|result| (*result).clone())
    }

    /// The completion as an observable that emits the result once, then finishes.
    ///
    /// Subscribers that arrive after completion still receive the result.
    pub fn to_observable(&self) -> Observable<Try<A>> {
        let subject = ReplaySubject::new();
        let sink = subject.clone();
        self.on_complete(move |result| {
            let _ = sink.push(result.clone());
            let _ = sink.finish();
        });
        subject.observable()
    }
}

impl<A: fmt::Debug> fmt::Debug for Future<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.peek() {
            Some(result) => f.debug_tuple("Future").field(&*result).finish(),
            None => f.write_str("Future(<pending>)"),
        }
    }
}
