//! Future and promise example
//!
//! A worker thread produces results; the main thread runs the continuations.

use std::thread;
use std::time::Duration;

use rivulet::{in_async_seq, Future, MainQueue, RxError, Source, Try};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("=== Worker to Main Thread ===\n");

    let queue = MainQueue::new();
    let worker_queue = queue.clone();
    let download = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        worker_queue.post_future(|| "level-3.dat".len())
    })
    .join()
    .expect("worker thread panicked");

    let report = download
        .map(|bytes| bytes * 1024)
        .recover(|err| {
            println!("download failed: {err}");
            0
        });
    report.on_success(|size| println!("downloaded {size} bytes"));

    println!("Running main queue...");
    queue.run_pending();

    println!("\n=== Sequential Steps ===\n");

    let step_queue = queue.clone();
    let progress = in_async_seq(["config", "assets", "broken", "save"], move |step| {
        step_queue
            .post_future(move || {
                if step == "broken" {
                    Err(RxError::msg(format!("{step} could not load")))
                } else {
                    Ok(step.len())
                }
            })
            .flat_map(|result| match result {
                Ok(size) => Future::successful(*size),
                Err(err) => Future::failed(err.clone()),
            })
    });

    let _progress = progress.subscribe(|step: &Option<Try<usize>>| match step {
        None => println!("waiting for the first step"),
        Some(Try::Success(size)) => println!("step done ({size})"),
        Some(Try::Failure(err)) => println!("step failed: {err}"),
    });

    while queue.run_pending() > 0 {}
    println!("Final: {:?}", progress.value());
}
