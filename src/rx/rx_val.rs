use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use crate::observable::{Core, Observable, Observer, Source, Subscription};
use crate::sync::{MutexExt, RwLockExt};

pub(crate) type Comparer<A> = Arc<dyn Fn(&A, &A) -> bool + Send + Sync>;

type Refresh<A> = Box<dyn Fn() -> A + Send + Sync>;

/// Storage shared by every handle to one reactive value.
pub(crate) struct Cell<A> {
    core: Arc<Core<A>>,
    current: RwLock<A>,
    comparer: Comparer<A>,
    /// Recomputes the value from upstream while nothing is connected.
    refresh: Option<Refresh<A>>,
    /// Permanent upstream subscription of a cell that follows its input at all times.
    feed: Mutex<Option<Subscription>>,
}

impl<A: Clone + Send + Sync + 'static> Cell<A> {
    pub(crate) fn root(label: &'static str, initial: A, comparer: Comparer<A>) -> Arc<Self> {
        Arc::new(Self {
            core: Core::new(label, None),
            current: RwLock::new(initial),
            comparer,
            refresh: None,
            feed: Mutex::new(None),
        })
    }

    /// A cell that mirrors `stream` while it has subscribers and falls back to `refresh`
    /// otherwise.
    fn derived<R>(label: &'static str, stream: Observable<A>, refresh: R) -> Arc<Self>
    where
        A: PartialEq,
        R: Fn() -> A + Send + Sync + 'static,
    {
        let initial = refresh();
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let connect = move |sink: &crate::observable::Sink<A>| {
                let Some(cell) = weak.upgrade() else {
                    return;
                };
                sink.hold(stream.subscribe(move |value: &A| {
                    cell.update(value.clone());
                }));
            };
            Self {
                core: Core::new(label, Some(Box::new(connect))),
                current: RwLock::new(initial),
                comparer: Arc::new(|a: &A, b: &A| a == b),
                refresh: Some(Box::new(refresh)),
                feed: Mutex::new(None),
            }
        })
    }

    /// A cell that stays subscribed to `stream` for as long as it lives, whether or not it
    /// has subscribers of its own.
    ///
    /// Used where the pushed value depends on history, so recomputing on read would disagree
    /// with what a connected cell holds.
    fn following(label: &'static str, stream: Observable<A>, initial: A) -> Arc<Self>
    where
        A: PartialEq,
    {
        let cell = Arc::new(Self {
            core: Core::new(label, None),
            current: RwLock::new(initial),
            comparer: Arc::new(|a: &A, b: &A| a == b),
            refresh: None,
            feed: Mutex::new(None),
        });
        let weak = Arc::downgrade(&cell);
        let subscription = stream.subscribe_with(move |value: &A, own| match weak.upgrade() {
            Some(cell) => {
                cell.update(value.clone());
            }
            None => {
                own.unsubscribe();
            }
        });
        *cell.feed.locked() = Some(subscription);
        cell
    }

    /// The stored value, recomputed first if the cell is derived and disconnected.
    pub(crate) fn value(&self) -> A {
        if let Some(refresh) = &self.refresh {
            if self.core.subscribers() == 0 {
                let fresh = refresh();
                *self.current.write_locked() = fresh;
            }
        }
        self.current()
    }

    fn current(&self) -> A {
        self.current.read_locked().clone()
    }

    /// Store and dispatch `value` unless the comparer finds it equal to the stored one.
    ///
    /// The comparer runs without any lock held, so it may read this cell.
    pub(crate) fn update(&self, value: A) -> bool {
        if (self.comparer)(&self.current(), &value) {
            return false;
        }
        *self.current.write_locked() = value.clone();
        let _ = self.core.dispatch(&value);
        true
    }

    /// Mutate a copy of the stored value, store it and dispatch the result unconditionally.
    pub(crate) fn modify<F: FnOnce(&mut A)>(&self, f: F) -> A {
        let mut value = self.current();
        f(&mut value);
        *self.current.write_locked() = value.clone();
        let _ = self.core.dispatch(&value);
        value
    }

    pub(crate) fn attach(
        &self,
        observer: Arc<dyn Observer<A>>,
        subscription: Subscription,
    ) -> Subscription {
        // Bring a disconnected derived cell up to date before connecting, so the value the
        // upstream replays on connect compares equal and is not dispatched twice.
        let _ = self.value();
        let subscription = self.core.attach(Arc::clone(&observer), subscription);
        if subscription.is_subscribed() {
            observer.push(&self.current());
        }
        subscription
    }

    pub(crate) fn subscribers(&self) -> usize {
        self.core.subscribers()
    }
}

impl<A> Drop for Cell<A> {
    fn drop(&mut self) {
        let feed = self
            .feed
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(subscription) = feed {
            subscription.unsubscribe();
        }
    }
}

/// An observable that always has a current value.
///
/// Subscribing delivers the current value first, then every later change. Values derived
/// with [`RxVal::map`], [`RxVal::flat_map`] and the `zip` family are computed eagerly and
/// suppress consecutive equal values. `map` and the `zip` family follow their inputs only
/// while they have subscribers and recompute on read otherwise; `flat_map` follows its input
/// for as long as it lives.
///
/// ```
/// use rivulet::{RxRef, Source};
/// use std::sync::{Arc, Mutex};
///
/// let width = RxRef::new(3);
/// let area = width.as_val().map(|w| w * w);
/// assert_eq!(area.value(), 9);
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let seen_clone = seen.clone();
/// area.subscribe(move |a| seen_clone.lock().unwrap().push(*a));
/// width.set(4);
/// assert_eq!(*seen.lock().unwrap(), vec![9, 16]);
/// ```
pub struct RxVal<A> {
    pub(crate) cell: Arc<Cell<A>>,
}

impl<A> Clone for RxVal<A> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<A: Clone + Send + Sync + 'static> RxVal<A> {
    /// A value that never changes.
    pub fn constant(value: A) -> Self {
        Self {
            cell: Cell::root("rx_constant", value, Arc::new(|_: &A, _: &A| true)),
        }
    }

    pub fn value(&self) -> A {
        self.cell.value()
    }

    pub fn map<B, F>(&self, f: F) -> RxVal<B>
    where
        B: Clone + PartialEq + Send + Sync + 'static,
        F: Fn(&A) -> B + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let (source, g) = (self.clone(), Arc::clone(&f));
        let stream = Source::map(self, move |a: &A| f(a));
        RxVal {
            cell: Cell::derived("rx_map", stream, move || g(&source.value())),
        }
    }

    /// Follow the value produced by `f` for the current input.
    ///
    /// Like [`Source::flat_map`], every value selected so far keeps feeding the result. The
    /// result stays subscribed to `self` for its whole lifetime, so [`RxVal::value`] reports
    /// the same value with or without subscribers.
    pub fn flat_map<B, F>(&self, f: F) -> RxVal<B>
    where
        B: Clone + PartialEq + Send + Sync + 'static,
        F: Fn(&A) -> RxVal<B> + Send + Sync + 'static,
    {
        let initial = f(&self.value()).value();
        let stream = Source::flat_map(self, f);
        RxVal {
            cell: Cell::following("rx_flat_map", stream, initial),
        }
    }

    pub fn zip<B>(&self, other: &RxVal<B>) -> RxVal<(A, B)>
    where
        A: PartialEq,
        B: Clone + PartialEq + Send + Sync + 'static,
    {
        let (a, b) = (self.clone(), other.clone());
        let stream = Source::zip(self, other);
        RxVal {
            cell: Cell::derived("rx_zip", stream, move || (a.value(), b.value())),
        }
    }

    pub fn zip3<B, C>(&self, b: &RxVal<B>, c: &RxVal<C>) -> RxVal<(A, B, C)>
    where
        A: PartialEq,
        B: Clone + PartialEq + Send + Sync + 'static,
        C: Clone + PartialEq + Send + Sync + 'static,
    {
        let (ra, rb, rc) = (self.clone(), b.clone(), c.clone());
        let stream = Source::zip3(self, b, c);
        RxVal {
            cell: Cell::derived("rx_zip3", stream, move || {
                (ra.value(), rb.value(), rc.value())
            }),
        }
    }

    pub fn zip4<B, C, D>(&self, b: &RxVal<B>, c: &RxVal<C>, d: &RxVal<D>) -> RxVal<(A, B, C, D)>
    where
        A: PartialEq,
        B: Clone + PartialEq + Send + Sync + 'static,
        C: Clone + PartialEq + Send + Sync + 'static,
        D: Clone + PartialEq + Send + Sync + 'static,
    {
        let (ra, rb, rc, rd) = (self.clone(), b.clone(), c.clone(), d.clone());
        let stream = Source::zip4(self, b, c, d);
        RxVal {
            cell: Cell::derived("rx_zip4", stream, move || {
                (ra.value(), rb.value(), rc.value(), rd.value())
            }),
        }
    }

    #[allow(clippy::type_complexity)]
    pub fn zip5<B, C, D, E>(
        &self,
        b: &RxVal<B>,
        c: &RxVal<C>,
        d: &RxVal<D>,
        e: &RxVal<E>,
    ) -> RxVal<(A, B, C, D, E)>
    where
        A: PartialEq,
        B: Clone + PartialEq + Send + Sync + 'static,
        C: Clone + PartialEq + Send + Sync + 'static,
        D: Clone + PartialEq + Send + Sync + 'static,
        E: Clone + PartialEq + Send + Sync + 'static,
    {
        let (ra, rb, rc, rd, re) = (self.clone(), b.clone(), c.clone(), d.clone(), e.clone());
        let stream = Source::zip5(self, b, c, d, e);
        RxVal {
            cell: Cell::derived("rx_zip5", stream, move || {
                (ra.value(), rb.value(), rc.value(), rd.value(), re.value())
            }),
        }
    }
}

impl<A: Clone + Send + Sync + 'static> Source<A> for RxVal<A> {
    fn attach(
        &self,
        observer: Arc<dyn Observer<A>>,
        subscription: Subscription,
    ) -> Subscription {
        self.cell.attach(observer, subscription)
    }

    fn subscribers(&self) -> usize {
        self.cell.subscribers()
    }
}

impl<A: Clone + fmt::Debug + Send + Sync + 'static> fmt::Debug for RxVal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RxVal")
            .field("value", &self.value())
            .field("subscribers", &self.subscribers())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rx::RxRef;
    use std::sync::Mutex;

    fn collect<A: Clone + Send + Sync + 'static>(
        source: &impl Source<A>,
    ) -> (Arc<Mutex<Vec<A>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let subscription = source.subscribe(move |a: &A| seen_clone.lock().unwrap().push(a.clone()));
        (seen, subscription)
    }

    #[test]
    fn constant_replays_to_each_subscriber() {
        let answer = RxVal::constant(42);
        let (first, _) = collect(&answer);
        let (second, _) = collect(&answer);
        assert_eq!(*first.lock().unwrap(), vec![42]);
        assert_eq!(*second.lock().unwrap(), vec![42]);
    }

    #[test]
    fn map_is_eager_and_tracks_changes_without_subscribers() {
        let source = RxRef::new(2);
        let doubled = source.as_val().map(|n| n * 2);
        assert_eq!(doubled.value(), 4);
        assert_eq!(source.subscribers(), 0);

        source.set(5);
        assert_eq!(doubled.value(), 10);
    }

    #[test]
    fn map_suppresses_equal_results() {
        let source = RxRef::new(1);
        let parity = source.as_val().map(|n| n % 2);
        let (seen, _) = collect(&parity);

        source.set(3);
        source.set(4);
        source.set(6);
        assert_eq!(*seen.lock().unwrap(), vec![1, 0]);
    }

    #[test]
    fn unsubscribing_releases_the_input() {
        let source = RxRef::new(0);
        let mapped = source.as_val().map(|n| n + 1);
        let (_, subscription) = collect(&mapped);
        assert_eq!(source.subscribers(), 1);

        subscription.unsubscribe();
        assert_eq!(source.subscribers(), 0);
        assert_eq!(mapped.subscribers(), 0);
    }

    #[test]
    fn zip_starts_with_both_current_values() {
        let a = RxRef::new(1);
        let b = RxRef::new("x");
        let zipped = a.as_val().zip(&b.as_val());
        assert_eq!(zipped.value(), (1, "x"));

        let (seen, _) = collect(&zipped);
        b.set("y");
        a.set(2);
        assert_eq!(*seen.lock().unwrap(), vec![(1, "x"), (1, "y"), (2, "y")]);
    }

    #[test]
    fn zip5_combines_all_inputs() {
        let refs: Vec<RxRef<i32>> = (1..=5).map(RxRef::new).collect();
        let vals: Vec<RxVal<i32>> = refs.iter().map(RxRef::as_val).collect();
        let zipped = vals[0].zip5(&vals[1], &vals[2], &vals[3], &vals[4]);
        assert_eq!(zipped.value(), (1, 2, 3, 4, 5));

        let (seen, _) = collect(&zipped);
        refs[4].set(50);
        assert_eq!(seen.lock().unwrap().last(), Some(&(1, 2, 3, 4, 50)));
    }

    #[test]
    fn flat_map_follows_the_selected_value() {
        let left = RxRef::new(10);
        let right = RxRef::new(20);
        let use_left = RxRef::new(true);
        let (l, r) = (left.as_val(), right.as_val());
        let selected = use_left
            .as_val()
            .flat_map(move |pick| if *pick { l.clone() } else { r.clone() });
        assert_eq!(selected.value(), 10);

        let (seen, _) = collect(&selected);
        use_left.set(false);
        right.set(21);
        assert_eq!(*seen.lock().unwrap(), vec![10, 20, 21]);
    }

    #[test]
    fn flat_map_value_does_not_depend_on_subscribers() {
        let left = RxRef::new(10);
        let right = RxRef::new(20);
        let use_left = RxRef::new(true);
        let (l, r) = (left.as_val(), right.as_val());
        let selected = use_left
            .as_val()
            .flat_map(move |pick| if *pick { l.clone() } else { r.clone() });

        let (seen, subscription) = collect(&selected);
        use_left.set(false);
        left.set(11);
        assert_eq!(*seen.lock().unwrap(), vec![10, 20, 11]);
        let connected = selected.value();

        subscription.unsubscribe();
        assert_eq!(selected.value(), connected);
        left.set(12);
        assert_eq!(selected.value(), 12);
    }

    #[test]
    fn dropping_a_flat_mapped_value_releases_its_input() {
        let inner = RxRef::new(1);
        let outer = RxRef::new(());
        let selected = {
            let inner = inner.as_val();
            outer.as_val().flat_map(move |_| inner.clone())
        };
        assert_eq!(outer.subscribers(), 1);
        assert_eq!(inner.subscribers(), 1);

        drop(selected);
        assert_eq!(outer.subscribers(), 0);
        assert_eq!(inner.subscribers(), 0);
    }
}
