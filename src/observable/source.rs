use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::observable::engine::Observable;
use crate::observable::observer::{FnObserver, Observer};
use crate::observable::Hooks;
use crate::observable::subscription::Subscription;
use crate::sync::MutexExt;

/// Anything that can be subscribed to: observables, subjects and reactive values.
///
/// The combinators return lazily connected [`Observable`]s: subscribing to the result
/// subscribes to `self` (and any other inputs) only when the result gets its first
/// subscriber, and unsubscribing the last subscriber releases those upstream subscriptions
/// again. Unsubscribing a leaf therefore tears down a whole chain.
pub trait Source<A: Send + Sync + 'static>: Clone + Send + Sync + 'static {
    /// Register `observer` under the given handle and return that handle.
    ///
    /// The handle may be [`Subscription::pending`] or one the observer already captured.
    fn attach(&self, observer: Arc<dyn Observer<A>>, subscription: Subscription)
        -> Subscription;

    /// Number of currently registered observers.
    fn subscribers(&self) -> usize;

    /// Whether the source has dispatched its finish event.
    fn is_finished(&self) -> bool {
        false
    }

    /// Register a full [`Observer`], which also hears finish events.
    fn subscribe_observer(&self, observer: Arc<dyn Observer<A>>) -> Subscription {
        self.attach(observer, Subscription::pending())
    }

    /// Call `f` for every value dispatched after this call.
    fn subscribe<F>(&self, f: F) -> Subscription
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        self.subscribe_observer(Arc::new(FnObserver(f)))
    }

    /// Like [`Source::subscribe`], but the callback also receives its own subscription, so it
    /// can unsubscribe itself.
    ///
    /// ```
    /// use rivulet::{Source, Subject};
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    ///
    /// let subject = Subject::new();
    /// let calls = Arc::new(AtomicUsize::new(0));
    /// let calls_clone = calls.clone();
    /// subject.subscribe_with(move |_: &(), subscription| {
    ///     calls_clone.fetch_add(1, Ordering::SeqCst);
    ///     subscription.unsubscribe();
    /// });
    ///
    /// subject.push(()).unwrap();
    /// subject.push(()).unwrap();
    /// assert_eq!(calls.load(Ordering::SeqCst), 1);
    /// ```
    fn subscribe_with<F>(&self, f: F) -> Subscription
    where
        F: Fn(&A, &Subscription) + Send + Sync + 'static,
    {
        let subscription = Subscription::pending();
        let own = subscription.clone();
        self.attach(Arc::new(FnObserver(move |a: &A| f(a, &own))), subscription)
    }

    /// Re-push `f(value)` for every upstream value.
    fn map<B, F>(&self, f: F) -> Observable<B>
    where
        B: Send + Sync + 'static,
        F: Fn(&A) -> B + Send + Sync + 'static,
    {
        let source = self.clone();
        let f = Arc::new(f);
        Observable::derived_labeled("map", move |sink| {
            let f = Arc::clone(&f);
            let out = sink.clone();
            sink.hold(source.subscribe_observer(Hooks::observer(
                move |a: &A| {
                    let _ = out.push(&f(a));
                },
                sink.finisher(),
            )));
        })
    }

    /// Re-push only the values for which `predicate` holds.
    fn filter<F>(&self, predicate: F) -> Observable<A>
    where
        F: Fn(&A) -> bool + Send + Sync + 'static,
    {
        let source = self.clone();
        let predicate = Arc::new(predicate);
        Observable::derived_labeled("filter", move |sink| {
            let predicate = Arc::clone(&predicate);
            let out = sink.clone();
            sink.hold(source.subscribe_observer(Hooks::observer(
                move |a: &A| {
                    if predicate(a) {
                        let _ = out.push(a);
                    }
                },
                sink.finisher(),
            )));
        })
    }

    /// Drop the first `count` values seen by each connection, then pass everything through.
    fn skip(&self, count: usize) -> Observable<A> {
        let source = self.clone();
        Observable::derived_labeled("skip", move |sink| {
            let seen = AtomicUsize::new(0);
            let out = sink.clone();
            sink.hold(source.subscribe_observer(Hooks::observer(
                move |a: &A| {
                    if seen.fetch_add(1, Ordering::AcqRel) >= count {
                        let _ = out.push(a);
                    }
                },
                sink.finisher(),
            )));
        })
    }

    /// Subscribe to `f(value)` for every upstream value and re-push what the inner
    /// observables produce.
    ///
    /// Inner subscriptions are never switched away: every inner observable created so far
    /// keeps feeding the result until the result itself disconnects. Finishing an inner
    /// observable does not finish the result; finishing `self` does.
    fn flat_map<B, S, F>(&self, f: F) -> Observable<B>
    where
        B: Send + Sync + 'static,
        S: Source<B>,
        F: Fn(&A) -> S + Send + Sync + 'static,
    {
        let source = self.clone();
        let f = Arc::new(f);
        Observable::derived_labeled("flat_map", move |sink| {
            let f = Arc::clone(&f);
            let outer = sink.clone();
            sink.hold(source.subscribe_observer(Hooks::observer(
                move |a: &A| {
                    let inner_out = outer.clone();
                    let inner = f(a).subscribe(move |b: &B| {
                        let _ = inner_out.push(b);
                    });
                    outer.hold(inner);
                },
                sink.finisher(),
            )));
        })
    }

    /// Re-push every item of the iterable `f(value)`, in order.
    fn flat_map_iter<B, I, F>(&self, f: F) -> Observable<B>
    where
        B: Send + Sync + 'static,
        I: IntoIterator<Item = B>,
        F: Fn(&A) -> I + Send + Sync + 'static,
    {
        let source = self.clone();
        let f = Arc::new(f);
        Observable::derived_labeled("flat_map_iter", move |sink| {
            let f = Arc::clone(&f);
            let out = sink.clone();
            sink.hold(source.subscribe_observer(Hooks::observer(
                move |a: &A| {
                    for b in f(a) {
                        let _ = out.push(&b);
                    }
                },
                sink.finisher(),
            )));
        })
    }

    /// Combine with `other`, emitting the latest pair.
    ///
    /// Nothing is emitted until both inputs have produced a value; after that every value
    /// from either input emits a pair made of the latest value of each. The result finishes
    /// once both inputs have finished.
    fn zip<B, S>(&self, other: &S) -> Observable<(A, B)>
    where
        A: Clone,
        B: Clone + Send + Sync + 'static,
        S: Source<B>,
    {
        let left = self.clone();
        let right = other.clone();
        Observable::derived_labeled("zip", move |sink| {
            let latest = Arc::new(Mutex::new(Latest::<A, B>::default()));

            let (state, out) = (Arc::clone(&latest), sink.clone());
            let (done_state, done_out) = (Arc::clone(&latest), sink.clone());
            sink.hold(left.subscribe_observer(Hooks::observer(
                move |a: &A| {
                    let pair = {
                        let mut latest = state.locked();
                        latest.left = Some(a.clone());
                        latest.pair()
                    };
                    if let Some(pair) = pair {
                        let _ = out.push(&pair);
                    }
                },
                move || Latest::finish_one(&done_state, &done_out),
            )));

            let (state, out) = (Arc::clone(&latest), sink.clone());
            let (done_state, done_out) = (Arc::clone(&latest), sink.clone());
            sink.hold(right.subscribe_observer(Hooks::observer(
                move |b: &B| {
                    let pair = {
                        let mut latest = state.locked();
                        latest.right = Some(b.clone());
                        latest.pair()
                    };
                    if let Some(pair) = pair {
                        let _ = out.push(&pair);
                    }
                },
                move || Latest::finish_one(&done_state, &done_out),
            )));
        })
    }

    fn zip3<B, C, SB, SC>(&self, b: &SB, c: &SC) -> Observable<(A, B, C)>
    where
        A: Clone,
        B: Clone + Send + Sync + 'static,
        C: Clone + Send + Sync + 'static,
        SB: Source<B>,
        SC: Source<C>,
    {
        self.zip(b)
            .zip(c)
            .map(|((a, b), c)| (a.clone(), b.clone(), c.clone()))
    }

    fn zip4<B, C, D, SB, SC, SD>(&self, b: &SB, c: &SC, d: &SD) -> Observable<(A, B, C, D)>
    where
        A: Clone,
        B: Clone + Send + Sync + 'static,
        C: Clone + Send + Sync + 'static,
        D: Clone + Send + Sync + 'static,
        SB: Source<B>,
        SC: Source<C>,
        SD: Source<D>,
    {
        self.zip3(b, c)
            .zip(d)
            .map(|((a, b, c), d)| (a.clone(), b.clone(), c.clone(), d.clone()))
    }

    #[allow(clippy::type_complexity)]
    fn zip5<B, C, D, E, SB, SC, SD, SE>(
        &self,
        b: &SB,
        c: &SC,
        d: &SD,
        e: &SE,
    ) -> Observable<(A, B, C, D, E)>
    where
        A: Clone,
        B: Clone + Send + Sync + 'static,
        C: Clone + Send + Sync + 'static,
        D: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
        SB: Source<B>,
        SC: Source<C>,
        SD: Source<D>,
        SE: Source<E>,
    {
        self.zip4(b, c, d).zip(e).map(|((a, b, c, d), e)| {
            (a.clone(), b.clone(), c.clone(), d.clone(), e.clone())
        })
    }

    /// Type-erase into a plain [`Observable`].
    fn to_observable(&self) -> Observable<A> {
        Observable::from_source(self.clone())
    }
}

/// Latest value of each side of a zip.
struct Latest<A, B> {
    left: Option<A>,
    right: Option<B>,
    finished: u8,
}

impl<A, B> Default for Latest<A, B> {
    fn default() -> Self {
        Self {
            left: None,
            right: None,
            finished: 0,
        }
    }
}

impl<A: Clone + Send + Sync + 'static, B: Clone + Send + Sync + 'static> Latest<A, B> {
    fn pair(&self) -> Option<(A, B)> {
        match (&self.left, &self.right) {
            (Some(a), Some(b)) => Some((a.clone(), b.clone())),
            _ => None,
        }
    }

    fn finish_one(latest: &Mutex<Self>, sink: &crate::observable::Sink<(A, B)>) {
        let all_done = {
            let mut latest = latest.locked();
            latest.finished += 1;
            latest.finished == 2
        };
        if all_done {
            let _ = sink.finish();
        }
    }
}
