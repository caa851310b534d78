//! Funnelling work onto the main thread.

mod main_queue;

pub use main_queue::MainQueue;
