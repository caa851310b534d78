/// A value that is one of two alternatives, biased towards [`Either::Right`] for mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Either<L, R> {
    Left(L),
    Right(R),
}

impl<L, R> Either<L, R> {
    pub fn is_left(&self) -> bool {
        matches!(self, Either::Left(_))
    }

    pub fn is_right(&self) -> bool {
        matches!(self, Either::Right(_))
    }

    pub fn left(self) -> Option<L> {
        match self {
            Either::Left(l) => Some(l),
            Either::Right(_) => None,
        }
    }

    pub fn right(self) -> Option<R> {
        match self {
            Either::Left(_) => None,
            Either::Right(r) => Some(r),
        }
    }

    pub fn as_ref(&self) -> Either<&L, &R> {
        match self {
            Either::Left(l) => Either::Left(l),
            Either::Right(r) => Either::Right(r),
        }
    }

    pub fn map_right<RR>(self, f: impl FnOnce(R) -> RR) -> Either<L, RR> {
        match self {
            Either::Left(l) => Either::Left(l),
            Either::Right(r) => Either::Right(f(r)),
        }
    }

    pub fn map_left<LL>(self, f: impl FnOnce(L) -> LL) -> Either<LL, R> {
        match self {
            Either::Left(l) => Either::Left(f(l)),
            Either::Right(r) => Either::Right(r),
        }
    }

    pub fn flat_map_right<RR>(self, f: impl FnOnce(R) -> Either<L, RR>) -> Either<L, RR> {
        match self {
            Either::Left(l) => Either::Left(l),
            Either::Right(r) => f(r),
        }
    }

    pub fn fold<B>(self, on_left: impl FnOnce(L) -> B, on_right: impl FnOnce(R) -> B) -> B {
        match self {
            Either::Left(l) => on_left(l),
            Either::Right(r) => on_right(r),
        }
    }

    pub fn swap(self) -> Either<R, L> {
        match self {
            Either::Left(l) => Either::Right(l),
            Either::Right(r) => Either::Left(r),
        }
    }

    pub fn into_result(self) -> Result<R, L> {
        match self {
            Either::Left(l) => Err(l),
            Either::Right(r) => Ok(r),
        }
    }
}

impl<L, R> From<Result<R, L>> for Either<L, R> {
    fn from(result: Result<R, L>) -> Self {
        match result {
            Ok(r) => Either::Right(r),
            Err(l) => Either::Left(l),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn right_biased_mapping() {
        let right: Either<&str, i32> = Either::Right(2);
        assert_eq!(right.map_right(|r| r * 10), Either::Right(20));

        let left: Either<&str, i32> = Either::Left("bad");
        assert_eq!(left.map_right(|r| r * 10), Either::Left("bad"));
        assert_eq!(
            left.flat_map_right(|r| Either::<&str, i32>::Right(r)),
            Either::Left("bad")
        );
    }

    #[test]
    fn projections_and_swap() {
        let e: Either<u8, char> = Either::Left(1);
        assert_eq!(e.left(), Some(1));
        assert_eq!(e.right(), None);
        assert_eq!(e.swap(), Either::Right(1));
        assert_eq!(e.into_result(), Err(1));
        assert_eq!(Either::<u8, char>::from(Ok('x')), Either::Right('x'));
    }
}
