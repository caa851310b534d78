use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::error::{RxError, RxResult};
use crate::observable::{Core, Observable, Observer, Source, Subscription};
use crate::sync::MutexExt;

#[derive(Clone)]
enum Event<A> {
    Value(A),
    Finished,
}

/// A subject that records everything pushed into it and replays the record to every new
/// subscriber.
///
/// Subscribing replays the logged values in order, then a finish event if one was logged,
/// before the call returns. A subscriber that joins after the finish only receives the
/// replay and is not registered. Pushes after finish are rejected exactly as on
/// [`Subject`](crate::Subject) and are not logged.
pub struct ReplaySubject<A> {
    core: Arc<Core<A>>,
    log: Arc<Mutex<Vec<Event<A>>>>,
}

impl<A> Clone for ReplaySubject<A> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
            log: Arc::clone(&self.log),
        }
    }
}

impl<A: Clone + Send + Sync + 'static> Default for ReplaySubject<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Clone + Send + Sync + 'static> ReplaySubject<A> {
    pub fn new() -> Self {
        Self {
            core: Core::new("replay_subject", None),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn push(&self, value: A) -> RxResult<()> {
        if self.core.is_finished() {
            warn!("push rejected by replay subject: already finished");
            return Err(RxError::Finished);
        }
        // Logged after dispatch: observers subscribing during this dispatch must not see it.
        self.core.dispatch(&value)?;
        self.log.locked().push(Event::Value(value));
        Ok(())
    }

    pub fn finish(&self) -> RxResult<()> {
        if self.core.is_finished() {
            warn!("finish rejected by replay subject: already finished");
            return Err(RxError::Finished);
        }
        // The finish marker goes first so that an observer joining during the finish
        // dispatch still hears it through the replay.
        self.log.locked().push(Event::Finished);
        self.core.finish()
    }

    /// Discard the event log. Live subscriptions and the finished flag are unaffected.
    pub fn clear(&self) {
        self.log.locked().clear();
    }

    /// Number of logged events, the finish marker included.
    pub fn logged(&self) -> usize {
        self.log.locked().len()
    }

    pub fn is_finished(&self) -> bool {
        self.core.is_finished()
    }

    pub fn observable(&self) -> Observable<A> {
        Source::to_observable(self)
    }
}

impl<A: Clone + Send + Sync + 'static> Source<A> for ReplaySubject<A> {
    fn attach(
        &self,
        observer: Arc<dyn Observer<A>>,
        subscription: Subscription,
    ) -> Subscription {
        // Read the log one event at a time: the observer may push while being replayed to,
        // and those values are logged but not dispatched to it.
        let mut next = 0;
        loop {
            if !subscription.is_subscribed() {
                return subscription;
            }
            let Some(event) = self.log.locked().get(next).cloned() else {
                break;
            };
            next += 1;
            match event {
                Event::Value(value) => observer.push(&value),
                Event::Finished => {
                    observer.finish();
                    subscription.cancel();
                    return subscription;
                }
            }
        }
        self.core.attach(observer, subscription)
    }

    fn subscribers(&self) -> usize {
        self.core.subscribers()
    }

    fn is_finished(&self) -> bool {
        self.core.is_finished()
    }
}

impl<A: Clone + Send + Sync + 'static> FromIterator<A> for Observable<A> {
    /// A cold observable: every subscriber receives all items, then a finish event.
    fn from_iter<I: IntoIterator<Item = A>>(iter: I) -> Self {
        let subject = ReplaySubject::new();
        for item in iter {
            let _ = subject.push(item);
        }
        let _ = subject.finish();
        subject.observable()
    }
}
