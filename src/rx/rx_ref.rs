use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::observable::{Observer, Source, Subscription};
use crate::rx::rx_val::{Cell, RxVal};

/// A mutable reactive value.
///
/// Writes go through an equality strategy: [`RxRef::set`] only stores and dispatches a value
/// the strategy considers different from the current one. [`RxRef::new`] compares with
/// `PartialEq`; [`RxRef::with_comparer`] takes any other strategy.
///
/// The new value is stored before it is dispatched, so subscribers that read
/// [`RxRef::value`] from inside their callback see the value being delivered.
///
/// ```
/// use rivulet::{RxRef, Source};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let volume = RxRef::new(5);
/// let events = Arc::new(AtomicUsize::new(0));
/// let events_clone = events.clone();
/// volume.subscribe(move |_| {
///     events_clone.fetch_add(1, Ordering::SeqCst);
/// });
/// assert_eq!(events.load(Ordering::SeqCst), 1);
///
/// assert!(!volume.set(5));
/// assert!(volume.set(7));
/// assert_eq!(events.load(Ordering::SeqCst), 2);
/// ```
pub struct RxRef<A> {
    val: RxVal<A>,
}

impl<A> Clone for RxRef<A> {
    fn clone(&self) -> Self {
        Self {
            val: self.val.clone(),
        }
    }
}

impl<A: Clone + PartialEq + Send + Sync + 'static> RxRef<A> {
    pub fn new(initial: A) -> Self {
        Self::with_comparer(initial, |a: &A, b: &A| a == b)
    }

    /// A reference that starts at `initial` and is set to every value `source` pushes.
    ///
    /// The returned subscription keeps the binding alive; unsubscribe it to stop following
    /// `source`.
    pub fn bound_to<S: Source<A>>(source: &S, initial: A) -> (Self, Subscription) {
        let rx_ref = Self::new(initial);
        let target = rx_ref.clone();
        let subscription = source.subscribe(move |value: &A| {
            target.set(value.clone());
        });
        (rx_ref, subscription)
    }

    /// Derive a reference bound to this one in both directions.
    ///
    /// The derived reference starts at `f(value)` and follows every change of `self`
    /// through `f`. Writes to it are mapped back through `g` and written to `self`. The
    /// equality check on both sides stops the round trip once the values agree.
    ///
    /// `self` keeps the derived reference alive; the derived reference only holds `self`
    /// weakly.
    pub fn comap<B, F, G>(&self, f: F, g: G) -> RxRef<B>
    where
        B: Clone + PartialEq + Send + Sync + 'static,
        F: Fn(&A) -> B + Send + Sync + 'static,
        G: Fn(&B) -> A + Send + Sync + 'static,
    {
        let derived = RxRef::new(f(&self.value()));

        let target = derived.clone();
        self.subscribe(move |a: &A| {
            target.set(f(a));
        });

        let origin = Arc::downgrade(&self.val.cell);
        derived.subscribe_with(move |b: &B, own| match origin.upgrade() {
            Some(cell) => {
                cell.update(g(b));
            }
            None => {
                own.unsubscribe();
            }
        });
        derived
    }
}

impl<A: Clone + Send + Sync + 'static> RxRef<A> {
    /// A reference that treats two values as equal when `comparer` says so.
    pub fn with_comparer<C>(initial: A, comparer: C) -> Self
    where
        C: Fn(&A, &A) -> bool + Send + Sync + 'static,
    {
        Self {
            val: RxVal {
                cell: Cell::root("rx_ref", initial, Arc::new(comparer)),
            },
        }
    }

    pub fn value(&self) -> A {
        self.val.value()
    }

    /// Store and dispatch `value` if it differs from the current one.
    ///
    /// Returns whether anything changed.
    pub fn set(&self, value: A) -> bool {
        let changed = self.val.cell.update(value);
        if !changed {
            trace!("rx_ref write skipped: value unchanged");
        }
        changed
    }

    /// Mutate the value in place and notify subscribers, whether or not it changed.
    ///
    /// Returns the value after the change.
    pub fn change<F: FnOnce(&mut A)>(&self, f: F) -> A {
        self.val.cell.modify(f)
    }

    /// Read-only view of this reference.
    pub fn as_val(&self) -> RxVal<A> {
        self.val.clone()
    }

    pub fn into_val(self) -> RxVal<A> {
        self.val
    }
}

impl<A: Clone + Send + Sync + 'static> Source<A> for RxRef<A> {
    fn attach(
        &self,
        observer: Arc<dyn Observer<A>>,
        subscription: Subscription,
    ) -> Subscription {
        self.val.attach(observer, subscription)
    }

    fn subscribers(&self) -> usize {
        self.val.subscribers()
    }
}

impl<A: Clone + fmt::Debug + Send + Sync + 'static> fmt::Debug for RxRef<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RxRef")
            .field("value", &self.value())
            .field("subscribers", &self.subscribers())
            .finish()
    }
}
