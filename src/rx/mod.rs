//! Reactive values: observables that always hold a current value.
//!
//! - `RxVal<A>` - read-only; new subscribers get the current value first
//! - `RxRef<A>` - writable; equal writes are dropped by its equality strategy

mod rx_ref;
mod rx_val;

pub use rx_ref::RxRef;
pub use rx_val::RxVal;
