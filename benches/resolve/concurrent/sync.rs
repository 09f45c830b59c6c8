#![allow(dead_code)]

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use lazioc::{Container, FactoryKey, Lifetime};
use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Barrier,
    },
    thread,
    time::{Duration, Instant},
};

const THREADS: usize = 10;
const SCALING_THREADS: [usize; 5] = [1, 2, 4, 8, 12];

fn run_bench_threads<W, F>(threads: usize, mut make_test_fn: W, iters: u64) -> Duration
where
    W: FnMut() -> F,
    F: FnMut() + Send + 'static,
{
    let barrier = Arc::new(Barrier::new(threads + 1));
    let elapsed_handles = Arc::new((0..threads).map(|_| AtomicU64::default()).collect::<Box<[_]>>());

    thread::scope(|s| {
        for i in 0..threads {
            let barrier = barrier.clone();
            let elapsed_handles = elapsed_handles.clone();
            let mut test_fn = make_test_fn();

            s.spawn(move || {
                barrier.wait();
                let start = Instant::now();
                for _ in 0..iters {
                    test_fn();
                }
                elapsed_handles[i].store(start.elapsed().as_nanos() as u64, Ordering::Relaxed);
            });
        }

        barrier.wait();
    });

    let mut nanos = Vec::with_capacity(threads);
    for elapsed_handle in elapsed_handles.iter() {
        nanos.push(elapsed_handle.load(Ordering::Relaxed));
    }
    Duration::from_nanos(nanos.iter().sum::<u64>() / nanos.len() as u64)
}

struct A;

fn new_a() -> A {
    A
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent");
    group.sample_size(30);
    group.warm_up_time(Duration::from_secs(3));

    group.bench_function(BenchmarkId::new("resolve_single", THREADS), |b| {
        let container = Container::new();

        b.iter_custom(|iters| {
            run_bench_threads(
                THREADS,
                || {
                    let container = container.clone();
                    move || {
                        container.resolve(new_a).unwrap();
                    }
                },
                (iters + THREADS as u64 - 1) / THREADS as u64,
            )
        });
    });

    group.bench_function(BenchmarkId::new("resolve_cold", THREADS), |b| {
        let container = Container::new();
        let key = FactoryKey::named("a").unwrap();

        b.iter_custom(|iters| {
            run_bench_threads(
                THREADS,
                || {
                    let container = container.clone();
                    move || {
                        container.release_key(&key);
                        container.resolve_keyed(key, || A, Lifetime::Singleton).unwrap();
                    }
                },
                (iters + THREADS as u64 - 1) / THREADS as u64,
            )
        });
    });

    group.finish();

    let mut group = c.benchmark_group("scaling");
    group.sample_size(30);

    for threads in SCALING_THREADS {
        group.bench_function(BenchmarkId::new("resolve_single", threads), |b| {
            let container = Container::new();

            b.iter_custom(|iters| {
                run_bench_threads(
                    threads,
                    || {
                        let container = container.clone();
                        move || {
                            container.resolve(new_a).unwrap();
                        }
                    },
                    (iters + threads as u64 - 1) / threads as u64,
                )
            });
        });
    }

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
