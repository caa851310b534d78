use std::mem;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::sync::MutexExt;

type Callback<T> = Box<dyn FnOnce(&T) + Send>;

enum Slot<T> {
    Pending(Vec<Callback<T>>),
    Completed(Arc<T>),
}

/// A write-once slot with a queue of completion callbacks.
///
/// Completing the slot and draining its callbacks form one critical section, and
/// registering a callback either queues it or hands back the completed value under the same
/// lock, so no callback is lost or run twice when completion races with registration.
/// Callbacks themselves always run with the lock released.
pub(crate) struct CompletionCell<T> {
    slot: Mutex<Slot<T>>,
    condvar: Condvar,
}

impl<T> CompletionCell<T> {
    pub(crate) fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::Pending(Vec::new())),
            condvar: Condvar::new(),
        }
    }

    pub(crate) fn completed(value: T) -> Self {
        Self {
            slot: Mutex::new(Slot::Completed(Arc::new(value))),
            condvar: Condvar::new(),
        }
    }

    /// Store `value` and run the queued callbacks in registration order.
    ///
    /// Hands `value` back if the cell was already completed.
    pub(crate) fn complete(&self, value: T) -> Result<(), T> {
        let (value, callbacks) = {
            let mut slot = self.slot.locked();
            let callbacks = match &mut *slot {
                Slot::Completed(_) => return Err(value),
                Slot::Pending(callbacks) => mem::take(callbacks),
            };
            let value = Arc::new(value);
            *slot = Slot::Completed(Arc::clone(&value));
            (value, callbacks)
        };
        self.condvar.notify_all();
        for callback in callbacks {
            callback(&value);
        }
        Ok(())
    }

    /// Run `callback` with the value, now if the cell is complete, otherwise on completion.
    pub(crate) fn on_complete(&self, callback: Callback<T>) {
        let value = {
            let mut slot = self.slot.locked();
            match &mut *slot {
                Slot::Pending(callbacks) => {
                    callbacks.push(callback);
                    return;
                }
                Slot::Completed(value) => Arc::clone(value),
            }
        };
        callback(&value);
    }

    pub(crate) fn peek(&self) -> Option<Arc<T>> {
        match &*self.slot.locked() {
            Slot::Pending(_) => None,
            Slot::Completed(value) => Some(Arc::clone(value)),
        }
    }

    pub(crate) fn is_completed(&self) -> bool {
        matches!(&*self.slot.locked(), Slot::Completed(_))
    }

    /// Block the calling thread until the cell is complete.
    pub(crate) fn wait(&self) -> Arc<T> {
        let mut slot = self.slot.locked();
        loop {
            match &*slot {
                Slot::Completed(value) => return Arc::clone(value),
                Slot::Pending(_) => {
                    slot = self
                        .condvar
                        .wait(slot)
                        .unwrap_or_else(std::sync::PoisonError::into_inner);
                }
            }
        }
    }

    /// Like [`CompletionCell::wait`], giving up after `timeout`.
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> Option<Arc<T>> {
        let slot = self.slot.locked();
        let (slot, _) = self
            .condvar
            .wait_timeout_while(slot, timeout, |slot| matches!(slot, Slot::Pending(_)))
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match &*slot {
            Slot::Completed(value) => Some(Arc::clone(value)),
            Slot::Pending(_) => None,
        }
    }
}
