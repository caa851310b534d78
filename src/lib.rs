//! # Rivulet
//!
//! Push-based observables and single-assignment futures for event-driven applications.
//!
//! Rivulet provides two families of primitives that share one error type and one set of
//! value types:
//!
//! ## Observables (push streams)
//!
//! - `Subject<A>` / `ReplaySubject<A>` - sources that producers push into
//! - `Source<A>` - the trait every stream implements; carries `map`, `filter`, `skip`,
//!   `flat_map` and the `zip` family
//! - `RxVal<A>` / `RxRef<A>` - streams that always hold a current value
//!
//! Subscribing, unsubscribing and pushing are all legal from inside a callback. Derived
//! streams subscribe to their inputs only while someone is subscribed to them.
//!
//! ## Futures (single-assignment values)
//!
//! - `Promise<A>` / `Future<A>` - complete once, continue many times
//! - `in_async_seq` - run asynchronous steps strictly one after another
//! - `MainQueue` - hand work from worker threads to the main thread
//!
//! ## Value types
//!
//! `Try<A>`, `Either<L, R>` and the `OptionExt` helpers carry failure and absence.
//!
//! ```
//! use rivulet::{Source, Subject};
//! use std::sync::{Arc, Mutex};
//!
//! let keys = Subject::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let seen_clone = seen.clone();
//! let subscription = keys
//!     .filter(|c: &char| c.is_alphabetic())
//!     .map(|c| c.to_ascii_uppercase())
//!     .subscribe(move |c| seen_clone.lock().unwrap().push(*c));
//!
//! for c in ['a', '1', 'b'] {
//!     keys.push(c).unwrap();
//! }
//! assert_eq!(*seen.lock().unwrap(), vec!['A', 'B']);
//!
//! subscription.unsubscribe();
//! assert_eq!(keys.subscribers(), 0);
//! ```

pub mod dispatch;
pub mod error;
pub mod functional;
pub mod future;
pub mod observable;
pub mod rx;
pub mod subject;

mod sync;

pub use dispatch::MainQueue;
pub use error::{RxError, RxResult};
pub use functional::{Either, OptionExt, Try};
pub use future::{in_async_seq, promise, Future, Promise};
pub use observable::{Observable, Observer, Sink, Source, Subscription};
pub use rx::{RxRef, RxVal};
pub use subject::{ReplaySubject, Subject};
