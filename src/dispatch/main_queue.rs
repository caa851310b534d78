use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use tracing::{debug, trace, warn};

use crate::error::RxError;
use crate::functional::Try;
use crate::future::{promise, Future};
use crate::sync::MutexExt;

type Job = Box<dyn FnOnce() + Send>;

struct Shared {
    main: ThreadId,
    jobs: Mutex<VecDeque<Job>>,
}

/// A queue of work to run on the main thread.
///
/// Any thread may [`post`](MainQueue::post) jobs; the thread that created the queue drains
/// them by calling [`run_pending`](MainQueue::run_pending), typically once per frame or
/// event-loop turn. Jobs run in the order they were posted.
///
/// ```
/// use rivulet::{MainQueue, Try};
/// use std::thread;
///
/// let queue = MainQueue::new();
/// let worker_queue = queue.clone();
/// let answer = thread::spawn(move || worker_queue.post_future(|| 6 * 7))
///     .join()
///     .unwrap();
///
/// assert_eq!(answer.value(), None);
/// assert_eq!(queue.run_pending(), 1);
/// assert_eq!(answer.value(), Some(Try::Success(42)));
/// ```
#[derive(Clone)]
pub struct MainQueue {
    shared: Arc<Shared>,
}

impl Default for MainQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MainQueue {
    /// Create a queue whose main thread is the calling thread.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                main: thread::current().id(),
                jobs: Mutex::new(VecDeque::new()),
            }),
        }
    }

    pub fn is_main_thread(&self) -> bool {
        thread::current().id() == self.shared.main
    }

    /// Queue `job` for the next [`run_pending`](MainQueue::run_pending).
    pub fn post<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut jobs = self.shared.jobs.locked();
        jobs.push_back(Box::new(job));
        trace!(queued = jobs.len(), "job posted to main queue");
    }

    /// Run every job queued so far and return how many ran.
    ///
    /// Jobs posted while draining wait for the next call. A panicking job is logged and
    /// does not stop the jobs queued after it.
    pub fn run_pending(&self) -> usize {
        let jobs = mem::take(&mut *self.shared.jobs.locked());
        let count = jobs.len();
        if count > 0 {
            debug!(jobs = count, "running main queue");
        }
        for job in jobs {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
                warn!(error = %RxError::from_panic(payload), "main queue job panicked");
            }
        }
        count
    }

    /// Number of jobs waiting to run.
    pub fn pending(&self) -> usize {
        self.shared.jobs.locked().len()
    }

    /// Compute `f()` on the main thread and deliver the result through a future.
    ///
    /// A panic inside `f` completes the future with a failure.
    pub fn post_future<A, F>(&self, f: F) -> Future<A>
    where
        A: Send + Sync + 'static,
        F: FnOnce() -> A + Send + 'static,
    {
        let (promise, future) = promise();
        self.post(move || {
            let _ = promise.complete(Try::attempt(f));
        });
        future
    }

    /// Run `f` on the main thread and block until it has run.
    ///
    /// Called from the main thread itself, `f` runs immediately instead of being queued.
    pub fn post_and_wait<A, F>(&self, f: F) -> Try<A>
    where
        A: Clone + Send + Sync + 'static,
        F: FnOnce() -> A + Send + 'static,
    {
        if self.is_main_thread() {
            return Try::attempt(f);
        }
        self.post_future(f).wait()
    }
}

impl fmt::Debug for MainQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MainQueue")
            .field("main", &self.shared.main)
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn jobs_run_in_post_order() {
        let queue = MainQueue::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = order.clone();
            queue.post(move || order.lock().unwrap().push(i));
        }
        assert_eq!(queue.pending(), 3);
        assert_eq!(queue.run_pending(), 3);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(queue.run_pending(), 0);
    }

    #[test]
    fn jobs_posted_while_draining_wait_for_next_turn() {
        let queue = MainQueue::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let (inner_queue, inner_runs) = (queue.clone(), runs.clone());
        queue.post(move || {
            let runs = inner_runs.clone();
            inner_queue.post(move || {
                runs.fetch_add(1, Ordering::SeqCst);
            });
        });

        assert_eq!(queue.run_pending(), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(queue.run_pending(), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn post_future_captures_panics() {
        let queue = MainQueue::new();
        let future = queue.post_future(|| -> u8 { panic!("main thread job failed") });
        queue.run_pending();
        assert!(future.value().is_some_and(|result| result.is_failure()));
    }

    #[test]
    fn panicking_job_does_not_drop_the_rest_of_the_batch() {
        let queue = MainQueue::new();
        queue.post(|| panic!("first job failed"));
        let answer = queue.post_future(|| 7);

        assert_eq!(queue.run_pending(), 2);
        assert_eq!(queue.pending(), 0);
        assert_eq!(answer.value(), Some(Try::Success(7)));
    }

    #[test]
    fn post_and_wait_blocks_worker_until_main_runs() {
        let queue = MainQueue::new();
        let worker_queue = queue.clone();
        let worker = thread::spawn(move || worker_queue.post_and_wait(|| "ran on main"));

        while queue.run_pending() == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(worker.join().unwrap(), Try::Success("ran on main"));
    }

    #[test]
    fn post_and_wait_on_main_thread_runs_inline() {
        let queue = MainQueue::new();
        assert_eq!(queue.post_and_wait(|| 3), Try::Success(3));
        assert_eq!(queue.pending(), 0);
    }
}
