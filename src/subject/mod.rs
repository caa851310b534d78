//! Hot sources that producers push into.
//!
//! - [`Subject`] forwards events to whoever is subscribed right now
//! - [`ReplaySubject`] also records them and replays the record to late subscribers

mod replay;
#[allow(clippy::module_inception)]
mod subject;

pub use replay::ReplaySubject;
pub use subject::Subject;
