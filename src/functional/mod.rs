//! Value types used as failure and absence carriers.
//!
//! - `Try<A>` - a computed value or the error that prevented it
//! - `Either<L, R>` - one of two alternatives, right-biased
//! - `OptionExt` - checked access and folding for `Option`

mod attempt;
mod either;
mod option;

pub use attempt::Try;
pub use either::Either;
pub use option::OptionExt;
