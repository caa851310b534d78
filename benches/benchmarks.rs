use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use rivulet::{in_async_seq, promise, Future, RxRef, Source, Subject};

fn subject_push_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("subject_push");

    for subscriber_count in [1, 10, 100].iter() {
        let subject = Subject::<usize>::new();
        for _ in 0..*subscriber_count {
            subject.subscribe(|n| {
                black_box(n);
            });
        }

        group.bench_with_input(
            BenchmarkId::from_parameter(subscriber_count),
            subscriber_count,
            |b, _| {
                let mut i = 0;
                b.iter(|| {
                    let _ = subject.push(black_box(i));
                    i += 1;
                });
            },
        );
    }
    group.finish();
}

fn subscribe_unsubscribe_benchmark(c: &mut Criterion) {
    let subject = Subject::<usize>::new();
    for _ in 0..100 {
        subject.subscribe(|_| {});
    }

    c.bench_function("subscribe_unsubscribe", |b| {
        b.iter(|| {
            let subscription = subject.subscribe(|_| {});
            black_box(subscription.unsubscribe());
        });
    });
}

fn combinator_chain_benchmark(c: &mut Criterion) {
    let subject = Subject::<u64>::new();
    let _subscription = subject
        .map(|n| n.wrapping_mul(3))
        .filter(|n| n % 2 == 0)
        .skip(1)
        .subscribe(|n| {
            black_box(n);
        });

    c.bench_function("combinator_chain_push", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let _ = subject.push(black_box(i));
            i += 1;
        });
    });
}

fn rx_ref_set_benchmark(c: &mut Criterion) {
    let rx_ref = RxRef::new(0usize);
    let doubled = rx_ref.as_val().map(|n| n * 2);
    let _subscription = doubled.subscribe(|n| {
        black_box(n);
    });

    c.bench_function("rx_ref_set", |b| {
        let mut i = 0;
        b.iter(|| {
            rx_ref.set(black_box(i));
            i += 1;
        });
    });
}

fn future_chain_benchmark(c: &mut Criterion) {
    c.bench_function("future_map_chain", |b| {
        b.iter(|| {
            let (promise, future) = promise::<u32>();
            let chained = future
                .map(|n| n + 1)
                .flat_map(|n| Future::successful(n * 2))
                .map(|n| n.to_string());
            let _ = promise.complete_success(black_box(20));
            black_box(chained.value())
        });
    });
}

fn async_seq_benchmark(c: &mut Criterion) {
    c.bench_function("in_async_seq_1000", |b| {
        b.iter(|| {
            let progress = in_async_seq(0..black_box(1000u32), Future::successful);
            black_box(progress.value())
        });
    });
}

criterion_group!(
    benches,
    subject_push_benchmark,
    subscribe_unsubscribe_benchmark,
    combinator_chain_benchmark,
    rx_ref_set_benchmark,
    future_chain_benchmark,
    async_seq_benchmark,
);
criterion_main!(benches);
