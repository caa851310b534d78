use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};

/// Implemented by anything that keeps a subscriber list.
pub(crate) trait Detach: Send + Sync {
    fn detach(&self, id: u64);
}

struct Binding {
    id: u64,
    source: Weak<dyn Detach>,
}

struct Inner {
    active: AtomicBool,
    binding: OnceLock<Binding>,
}

/// A live registration of one observer with one observable.
///
/// The handle holds only a weak reference to the observable, so it never keeps an otherwise
/// unreferenced observable alive. Dropping the handle does not unsubscribe; call
/// [`Subscription::unsubscribe`] for that. Unsubscribing is idempotent and may happen from
/// inside the callback the subscription delivers to.
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<Inner>,
}

impl Subscription {
    /// Create a handle that is active but not yet attached to any observable.
    ///
    /// Sources attach it while registering an observer, which lets a callback hold its own
    /// subscription before registration completes (see
    /// [`Source::subscribe_with`](crate::Source::subscribe_with)).
    pub fn pending() -> Self {
        Self {
            inner: Arc::new(Inner {
                active: AtomicBool::new(true),
                binding: OnceLock::new(),
            }),
        }
    }

    /// Whether events are still delivered through this subscription.
    pub fn is_subscribed(&self) -> bool {
        self.inner.active.load(Ordering::Acquire)
    }

    /// Stop delivery and remove the observer from its observable.
    ///
    /// Returns `true` if this call ended the subscription, `false` if it was already over.
    pub fn unsubscribe(&self) -> bool {
        if !self.cancel() {
            return false;
        }
        self.detach();
        true
    }

    /// Clear the liveness flag without touching the observable.
    pub(crate) fn cancel(&self) -> bool {
        self.inner.active.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn bind(&self, id: u64, source: Weak<dyn Detach>) {
        let _ = self.inner.binding.set(Binding { id, source });
        // Unsubscribed while the observer was being registered.
        if !self.is_subscribed() {
            self.detach();
        }
    }

    fn detach(&self) {
        if let Some(binding) = self.inner.binding.get() {
            if let Some(source) = binding.source.upgrade() {
                source.detach(binding.id);
            }
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.inner.binding.get().map(|b| b.id))
            .field("subscribed", &self.is_subscribed())
            .finish()
    }
}
