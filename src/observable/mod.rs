//! The observable engine.
//!
//! An observable keeps an ordered list of observers. Dispatch walks a snapshot of that list
//! taken when the dispatch starts, and skips observers that unsubscribed in the meantime.
//! That makes it legal to subscribe, unsubscribe or push again from inside a callback:
//! - observers added during a dispatch only see later events
//! - an observer that unsubscribes is not called again, even by the dispatch in progress
//! - a nested push takes its own snapshot and leaves the outer one untouched
//!
//! The internal lock only guards the list itself and is never held while callbacks run.

mod engine;
mod observer;
mod source;
mod subscription;

pub use engine::{Observable, Sink};
pub use observer::Observer;
pub use source::Source;
pub use subscription::Subscription;

pub(crate) use engine::Core;
pub(crate) use observer::Hooks;
