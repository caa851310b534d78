//! Observable pipeline example
//!
//! Run with `RUST_LOG=rivulet=debug` to watch derived observables connect and disconnect.

use rivulet::{ReplaySubject, RxRef, Source, Subject};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("=== Subject Pipeline ===\n");

    let clicks = Subject::new();
    let subscription = clicks
        .filter(|x: &i32| *x >= 0)
        .map(|x| x * 2)
        .subscribe(|x| println!("doubled click at {x}"));

    for x in [3, -1, 7] {
        println!("Pushing {x}...");
        let _ = clicks.push(x);
    }
    subscription.unsubscribe();
    println!("Subscribers after unsubscribe: {}\n", clicks.subscribers());

    println!("=== Zip ===\n");

    let width = Subject::new();
    let height = Subject::new();
    let area = width.zip(&height).map(|(w, h): &(u32, u32)| w * h);
    let _area = area.subscribe(|a| println!("area = {a}"));
    let _ = width.push(4);
    println!("(no area yet, height unknown)");
    let _ = height.push(5);
    let _ = width.push(6);

    println!("\n=== ReplaySubject ===\n");

    let log = ReplaySubject::new();
    let _ = log.push("boot");
    let _ = log.push("ready");
    let _ = log.finish();
    log.subscribe(|line| println!("late subscriber saw: {line}"));
    if let Err(err) = log.push("too late") {
        println!("push after finish rejected: {err}");
    }

    println!("\n=== RxRef ===\n");

    let volume = RxRef::new(5u8);
    let label = volume.as_val().map(|v| format!("volume {v}/10"));
    let _label = label.subscribe(|text| println!("{text}"));
    println!("Setting volume to 5 again (no event)...");
    volume.set(5);
    println!("Setting volume to 8...");
    volume.set(8);

    let percent = volume.comap(|v| u32::from(*v) * 10, |p| (*p / 10) as u8);
    println!("Setting percent to 30...");
    percent.set(30);
    println!("Volume is now {}", volume.value());
}
