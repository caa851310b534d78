use crate::error::{RxError, RxResult};
use crate::functional::Either;

/// Extra combinators for [`Option`].
pub trait OptionExt<A> {
    /// Checked access: an empty option is reported as [`RxError::EmptyOption`].
    fn get_or_report(self) -> RxResult<A>;

    /// Collapse both cases into one value.
    fn fold<B>(self, if_empty: impl FnOnce() -> B, if_some: impl FnOnce(A) -> B) -> B;

    /// `Right` for a present value, `Left(left())` otherwise.
    fn to_right<L>(self, left: impl FnOnce() -> L) -> Either<L, A>;
}

impl<A> OptionExt<A> for Option<A> {
    fn get_or_report(self) -> RxResult<A> {
        self.ok_or(RxError::EmptyOption)
    }

    fn fold<B>(self, if_empty: impl FnOnce() -> B, if_some: impl FnOnce(A) -> B) -> B {
        match self {
            Some(a) => if_some(a),
            None => if_empty(),
        }
    }

    fn to_right<L>(self, left: impl FnOnce() -> L) -> Either<L, A> {
        match self {
            Some(a) => Either::Right(a),
            None => Either::Left(left()),
        }
    }
}
