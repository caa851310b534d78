use std::sync::Arc;

use tracing::warn;

use crate::error::RxResult;
use crate::observable::{Core, Observable, Observer, Source, Subscription};

/// A hot event source: an observable you can push into.
///
/// A subject remembers nothing. Subscribers only see events pushed after they subscribed.
/// After [`Subject::finish`], every further `push` or `finish` is rejected with
/// [`RxError::Finished`](crate::RxError::Finished) and nothing is dispatched.
///
/// # Examples
///
/// ```
/// use rivulet::{Source, Subject};
/// use std::sync::{Arc, Mutex};
///
/// let clicks = Subject::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let seen_clone = seen.clone();
/// clicks.subscribe(move |n: &u32| seen_clone.lock().unwrap().push(*n));
///
/// clicks.push(1).unwrap();
/// clicks.push(2).unwrap();
/// assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
///
/// clicks.finish().unwrap();
/// assert!(clicks.push(3).is_err());
/// ```
pub struct Subject<A> {
    core: Arc<Core<A>>,
}

impl<A> Clone for Subject<A> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<A: Send + Sync + 'static> Default for Subject<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Send + Sync + 'static> Subject<A> {
    pub fn new() -> Self {
        Self {
            core: Core::new("subject", None),
        }
    }

    /// Dispatch `value` to the current subscribers.
    pub fn push(&self, value: A) -> RxResult<()> {
        self.core.dispatch(&value).inspect_err(|err| {
            warn!(error = %err, "push rejected by subject");
        })
    }

    /// Finish the subject and notify the current subscribers.
    pub fn finish(&self) -> RxResult<()> {
        self.core.finish().inspect_err(|err| {
            warn!(error = %err, "finish rejected by subject");
        })
    }

    pub fn is_finished(&self) -> bool {
        self.core.is_finished()
    }

    /// The read side of this subject.
    pub fn observable(&self) -> Observable<A> {
        Observable::from_core(Arc::clone(&self.core))
    }
}

impl<A: Send + Sync + 'static> Source<A> for Subject<A> {
    fn attach(
        &self,
        observer: Arc<dyn Observer<A>>,
        subscription: Subscription,
    ) -> Subscription {
        self.core.attach(observer, subscription)
    }

    fn subscribers(&self) -> usize {
        self.core.subscribers()
    }

    fn is_finished(&self) -> bool {
        self.core.is_finished()
    }
}
