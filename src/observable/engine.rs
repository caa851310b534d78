use std::fmt;
use std::mem;
use std::sync::{Arc, Mutex, Weak};

use tracing::{debug, trace};

use crate::error::{RxError, RxResult};
use crate::observable::observer::Observer;
use crate::observable::source::Source;
use crate::observable::subscription::{Detach, Subscription};
use crate::sync::MutexExt;

type Connect<A> = Box<dyn Fn(&Sink<A>) + Send + Sync>;

struct Record<A> {
    id: u64,
    subscription: Subscription,
    observer: Arc<dyn Observer<A>>,
}

struct State<A> {
    records: Vec<Record<A>>,
    next_id: u64,
    finished: bool,
}

#[derive(Default)]
struct Upstream {
    connected: bool,
    subscriptions: Vec<Subscription>,
}

/// Subscriber list plus, for derived observables, the upstream connection.
pub(crate) struct Core<A> {
    label: &'static str,
    state: Mutex<State<A>>,
    connect: Option<Connect<A>>,
    upstream: Mutex<Upstream>,
}

impl<A: Send + Sync + 'static> Core<A> {
    pub(crate) fn new(label: &'static str, connect: Option<Connect<A>>) -> Arc<Self> {
        Arc::new(Self {
            label,
            state: Mutex::new(State {
                records: Vec::new(),
                next_id: 0,
                finished: false,
            }),
            connect,
            upstream: Mutex::new(Upstream::default()),
        })
    }

    pub(crate) fn attach(
        self: &Arc<Self>,
        observer: Arc<dyn Observer<A>>,
        subscription: Subscription,
    ) -> Subscription {
        if !subscription.is_subscribed() {
            return subscription;
        }

        let (id, first) = {
            let mut state = self.state.locked();
            if state.finished {
                drop(state);
                subscription.cancel();
                return subscription;
            }
            let id = state.next_id;
            state.next_id += 1;
            state.records.push(Record {
                id,
                subscription: subscription.clone(),
                observer,
            });
            (id, state.records.len() == 1)
        };

        let source: Weak<dyn Detach> = Arc::downgrade(self) as Weak<dyn Detach>;
        subscription.bind(id, source);

        if first && subscription.is_subscribed() {
            self.connect_upstream();
        }
        subscription
    }

    /// Deliver `value` to every observer registered before this call.
    pub(crate) fn dispatch(&self, value: &A) -> RxResult<()> {
        let snapshot = {
            let state = self.state.locked();
            if state.finished {
                return Err(RxError::Finished);
            }
            Self::snapshot(&state)
        };

        trace!(observable = self.label, subscribers = snapshot.len(), "dispatch");
        for (subscription, observer) in &snapshot {
            if subscription.is_subscribed() {
                observer.push(value);
            }
        }
        Ok(())
    }

    pub(crate) fn finish(&self) -> RxResult<()> {
        let snapshot = {
            let mut state = self.state.locked();
            if state.finished {
                return Err(RxError::Finished);
            }
            state.finished = true;
            Self::snapshot(&state)
        };

        trace!(observable = self.label, subscribers = snapshot.len(), "finish");
        for (subscription, observer) in &snapshot {
            if subscription.is_subscribed() {
                observer.finish();
            }
        }
        Ok(())
    }

    fn snapshot(state: &State<A>) -> Vec<(Subscription, Arc<dyn Observer<A>>)> {
        state
            .records
            .iter()
            .map(|r| (r.subscription.clone(), Arc::clone(&r.observer)))
            .collect()
    }

    pub(crate) fn subscribers(&self) -> usize {
        self.state.locked().records.len()
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.state.locked().finished
    }

    fn connect_upstream(self: &Arc<Self>) {
        let Some(connect) = &self.connect else {
            return;
        };
        {
            let mut upstream = self.upstream.locked();
            if upstream.connected {
                return;
            }
            upstream.connected = true;
        }
        debug!(observable = self.label, "connecting upstream");
        connect(&Sink {
            core: Arc::clone(self),
        });
    }

    fn disconnect_upstream(&self) {
        let subscriptions = {
            let mut upstream = self.upstream.locked();
            if !upstream.connected {
                return;
            }
            upstream.connected = false;
            mem::take(&mut upstream.subscriptions)
        };
        debug!(
            observable = self.label,
            upstream = subscriptions.len(),
            "disconnecting upstream"
        );
        for subscription in subscriptions {
            subscription.unsubscribe();
        }
    }

    fn hold(&self, subscription: Subscription) {
        let mut upstream = self.upstream.locked();
        if upstream.connected {
            // Subscriptions to finished sources are already over.
            upstream.subscriptions.retain(Subscription::is_subscribed);
            if subscription.is_subscribed() {
                upstream.subscriptions.push(subscription);
            }
        } else {
            // The last subscriber left while the connection was being set up.
            drop(upstream);
            subscription.unsubscribe();
        }
    }
}

impl<A: Send + Sync + 'static> Detach for Core<A> {
    fn detach(&self, id: u64) {
        let (removed, now_empty) = {
            let mut state = self.state.locked();
            match state.records.iter().position(|r| r.id == id) {
                Some(index) => {
                    let record = state.records.remove(index);
                    (Some(record), state.records.is_empty())
                }
                None => (None, false),
            }
        };
        // Observers may own other observables; release them outside the lock.
        drop(removed);
        if now_empty {
            self.disconnect_upstream();
        }
    }
}

/// Object-safe view of a [`Source`], used to type-erase sources behind [`Observable`].
trait Erased<A>: Send + Sync {
    fn attach(&self, observer: Arc<dyn Observer<A>>, subscription: Subscription) -> Subscription;
    fn subscribers(&self) -> usize;
    fn is_finished(&self) -> bool;
    fn label(&self) -> &'static str;
}

struct CoreHandle<A>(Arc<Core<A>>);

impl<A: Send + Sync + 'static> Erased<A> for CoreHandle<A> {
    fn attach(&self, observer: Arc<dyn Observer<A>>, subscription: Subscription) -> Subscription {
        self.0.attach(observer, subscription)
    }

    fn subscribers(&self) -> usize {
        self.0.subscribers()
    }

    fn is_finished(&self) -> bool {
        self.0.is_finished()
    }

    fn label(&self) -> &'static str {
        self.0.label
    }
}

struct SourceHandle<S>(S);

impl<A: Send + Sync + 'static, S: Source<A>> Erased<A> for SourceHandle<S> {
    fn attach(&self, observer: Arc<dyn Observer<A>>, subscription: Subscription) -> Subscription {
        self.0.attach(observer, subscription)
    }

    fn subscribers(&self) -> usize {
        self.0.subscribers()
    }

    fn is_finished(&self) -> bool {
        self.0.is_finished()
    }

    fn label(&self) -> &'static str {
        std::any::type_name::<S>()
    }
}

/// A stream of values that can be subscribed to.
///
/// `Observable` is a cheap, type-erased handle; clones share the same subscriber list.
/// Root observables are driven by [`Subject`](crate::Subject),
/// [`ReplaySubject`](crate::ReplaySubject) or [`RxRef`](crate::RxRef). Derived observables
/// (the combinators on [`Source`]) subscribe to their upstream only while they have
/// subscribers themselves.
pub struct Observable<A> {
    source: Arc<dyn Erased<A>>,
}

impl<A> Clone for Observable<A> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<A: Send + Sync + 'static> Observable<A> {
    pub(crate) fn from_core(core: Arc<Core<A>>) -> Self {
        Self {
            source: Arc::new(CoreHandle(core)),
        }
    }

    /// Hide the concrete type of any source.
    pub fn from_source<S: Source<A>>(source: S) -> Self {
        Self {
            source: Arc::new(SourceHandle(source)),
        }
    }

    /// Build a derived observable.
    ///
    /// `connect` runs each time the subscriber count goes from zero to one. It subscribes to
    /// whatever upstream sources it needs and hands the subscriptions to
    /// [`Sink::hold`]; they are released when the subscriber count drops back to zero.
    ///
    /// ```
    /// use rivulet::{Observable, Source, Subject};
    /// use std::sync::{Arc, Mutex};
    ///
    /// let numbers = Subject::new();
    /// let upstream = numbers.clone();
    /// let doubled = Observable::derived(move |sink| {
    ///     let out = sink.clone();
    ///     sink.hold(upstream.subscribe(move |n: &i32| {
    ///         let _ = out.push(&(n * 2));
    ///     }));
    /// });
    ///
    /// let seen = Arc::new(Mutex::new(Vec::new()));
    /// let seen_clone = seen.clone();
    /// let subscription = doubled.subscribe(move |n| seen_clone.lock().unwrap().push(*n));
    /// assert_eq!(numbers.subscribers(), 1);
    ///
    /// numbers.push(21).unwrap();
    /// assert_eq!(*seen.lock().unwrap(), vec![42]);
    ///
    /// subscription.unsubscribe();
    /// assert_eq!(numbers.subscribers(), 0);
    /// ```
    pub fn derived<F>(connect: F) -> Self
    where
        F: Fn(&Sink<A>) + Send + Sync + 'static,
    {
        Self::derived_labeled("derived", connect)
    }

    pub(crate) fn derived_labeled<F>(label: &'static str, connect: F) -> Self
    where
        F: Fn(&Sink<A>) + Send + Sync + 'static,
    {
        Self::from_core(Core::new(label, Some(Box::new(connect))))
    }

    /// An observable that has already finished.
    pub fn empty() -> Self {
        let core = Core::new("empty", None);
        let _ = core.finish();
        Self::from_core(core)
    }
}

impl<A: Send + Sync + 'static> Source<A> for Observable<A> {
    fn attach(
        &self,
        observer: Arc<dyn Observer<A>>,
        subscription: Subscription,
    ) -> Subscription {
        self.source.attach(observer, subscription)
    }

    fn subscribers(&self) -> usize {
        self.source.subscribers()
    }

    fn is_finished(&self) -> bool {
        self.source.is_finished()
    }

    fn to_observable(&self) -> Observable<A> {
        self.clone()
    }
}

impl<A> fmt::Debug for Observable<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("source", &self.source.label())
            .finish_non_exhaustive()
    }
}

/// Write side of a derived observable, handed to its connect function.
pub struct Sink<A> {
    core: Arc<Core<A>>,
}

impl<A> Clone for Sink<A> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<A: Send + Sync + 'static> Sink<A> {
    /// Dispatch a value to the derived observable's subscribers.
    pub fn push(&self, value: &A) -> RxResult<()> {
        self.core.dispatch(value)
    }

    /// Finish the derived observable.
    pub fn finish(&self) -> RxResult<()> {
        self.core.finish()
    }

    /// Keep an upstream subscription until the derived observable disconnects.
    pub fn hold(&self, subscription: Subscription) {
        self.core.hold(subscription)
    }

    /// A callback that finishes this sink, for use as an upstream finish handler.
    pub(crate) fn finisher(&self) -> impl Fn() + Send + Sync + 'static {
        let sink = self.clone();
        move || {
            let _ = sink.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subject::Subject;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn empty_is_already_finished() {
        let empty = Observable::<i32>::empty();
        assert!(empty.is_finished());
        let subscription = empty.subscribe(|_| {});
        assert!(!subscription.is_subscribed());
        assert_eq!(empty.subscribers(), 0);
    }

    #[test]
    fn connect_runs_once_per_connection() {
        let connects = Arc::new(AtomicUsize::new(0));
        let counter = connects.clone();
        let upstream = Subject::<()>::new();
        let source = upstream.clone();
        let derived = Observable::<()>::derived(move |sink| {
            counter.fetch_add(1, Ordering::SeqCst);
            let out = sink.clone();
            sink.hold(source.subscribe(move |_| {
                let _ = out.push(&());
            }));
        });

        let first = derived.subscribe(|_| {});
        let second = derived.subscribe(|_| {});
        assert_eq!(connects.load(Ordering::SeqCst), 1);

        first.unsubscribe();
        second.unsubscribe();
        assert_eq!(upstream.subscribers(), 0);

        let third = derived.subscribe(|_| {});
        assert_eq!(connects.load(Ordering::SeqCst), 2);
        third.unsubscribe();
    }

    #[test]
    fn subscription_does_not_keep_observable_alive() {
        let subject = Subject::<u8>::new();
        let subscription = subject.subscribe(|_| {});
        drop(subject);
        assert!(subscription.unsubscribe());
        assert!(!subscription.is_subscribed());
    }

    #[test]
    fn unsubscribing_a_callback_before_registration_completes() {
        let subject = Subject::<u8>::new();
        let pending = Subscription::pending();
        pending.unsubscribe();
        let observer = Arc::new(crate::observable::observer::FnObserver(|_: &u8| {}));
        let attached = subject.attach(observer, pending);
        assert!(!attached.is_subscribed());
        assert_eq!(subject.subscribers(), 0);
    }

    #[test]
    fn debug_names_the_source() {
        let subject = Subject::<u8>::new();
        let rendered = format!("{:?}", subject.map(|n| n + 1));
        assert!(rendered.contains("map"));
    }

    #[test]
    fn finished_inner_subscriptions_are_not_held() {
        let numbers = Subject::<usize>::new();
        let upstream = numbers.clone();
        let core = Core::new(
            "flatten",
            Some(Box::new(move |sink: &Sink<usize>| {
                let outer = sink.clone();
                sink.hold(upstream.subscribe(move |n: &usize| {
                    let inner_out = outer.clone();
                    let items: Observable<usize> = (0..*n).collect();
                    outer.hold(items.subscribe(move |item| {
                        let _ = inner_out.push(item);
                    }));
                }));
            })),
        );
        let flattened = Observable::from_core(Arc::clone(&core));
        let emitted = Arc::new(AtomicUsize::new(0));
        let emitted_clone = emitted.clone();
        flattened.subscribe(move |_| {
            emitted_clone.fetch_add(1, Ordering::SeqCst);
        });

        for n in 1..=50 {
            numbers.push(n).unwrap();
        }
        assert_eq!(emitted.load(Ordering::SeqCst), (1..=50).sum::<usize>());
        assert_eq!(core.upstream.locked().subscriptions.len(), 1);
    }
}
