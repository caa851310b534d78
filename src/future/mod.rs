//! Single-assignment asynchronous values.
//!
//! A [`Promise`] is completed once with a [`Try`](crate::Try); its [`Future`] hands the
//! result to every continuation. Continuations run synchronously on the completing thread,
//! so hosts that want them on a particular thread complete promises from there (see
//! [`MainQueue`](crate::MainQueue)).

mod cell;
#[allow(clippy::module_inception)]
mod future;
mod seq;
mod transformers;

pub use future::{promise, Future, Promise};
pub use seq::in_async_seq;
