use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::trace;

use crate::functional::Try;
use crate::future::future::Future;
use crate::rx::{RxRef, RxVal};
use crate::sync::MutexExt;

/// Run `step` over `inputs` one at a time.
///
/// The future for an input is only requested once the previous input's future has
/// completed, successfully or not. The returned value starts at `None` and then holds the
/// result of the most recently completed step; every completion is delivered, even when it
/// equals the previous one. A step that panics counts as a failed step and the sequence
/// moves on.
///
/// ```
/// use rivulet::{in_async_seq, Future, Try};
///
/// let progress = in_async_seq(vec![1, 2, 3], |n| Future::successful(n * 10));
/// assert_eq!(progress.value(), Some(Try::Success(30)));
/// ```
pub fn in_async_seq<A, B, I, F>(inputs: I, step: F) -> RxVal<Option<Try<B>>>
where
    I: IntoIterator<Item = A>,
    I::IntoIter: Send + 'static,
    F: FnMut(A) -> Future<B> + Send + 'static,
    B: Clone + Send + Sync + 'static,
{
    let progress = RxRef::with_comparer(None, |_: &Option<Try<B>>, _: &Option<Try<B>>| false);
    let sequence = Arc::new(Sequence {
        driver: Mutex::new(Driver {
            inputs: inputs.into_iter(),
            step,
        }),
        progress: progress.clone(),
    });
    sequence.run();
    progress.into_val()
}

struct Driver<I, F> {
    inputs: I,
    step: F,
}

struct Sequence<I, F, B> {
    driver: Mutex<Driver<I, F>>,
    progress: RxRef<Option<Try<B>>>,
}

impl<A, B, I, F> Sequence<I, F, B>
where
    I: Iterator<Item = A> + Send + 'static,
    F: FnMut(A) -> Future<B> + Send + 'static,
    B: Clone + Send + Sync + 'static,
{
    /// Start steps until one of them has not completed yet.
    ///
    /// Steps that complete while their callback is being registered continue this loop
    /// instead of recursing, so long runs of already completed futures use constant stack.
    fn run(self: &Arc<Self>) {
        loop {
            let next = {
                let mut driver = self.driver.locked();
                let Driver { inputs, step } = &mut *driver;
                match inputs.next() {
                    Some(input) => Try::attempt(|| step(input)),
                    None => {
                        trace!("async sequence exhausted");
                        return;
                    }
                }
            };
            let future = match next {
                Try::Success(future) => future,
                Try::Failure(error) => Future::failed(error),
            };

            let registering = Arc::new(AtomicBool::new(true));
            let (flag, this) = (Arc::clone(&registering), Arc::clone(self));
            future.on_complete(move |result| {
                this.progress.set(Some(result.clone()));
                // Completed inline: the loop below picks up the next input.
                if !flag.swap(false, Ordering::AcqRel) {
                    this.run();
                }
            });
            if registering.swap(false, Ordering::AcqRel) {
                // Still pending; the completion callback resumes the sequence.
                return;
            }
        }
    }
}
