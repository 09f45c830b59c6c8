#![allow(dead_code)]

use criterion::{criterion_group, criterion_main, Criterion};
use lazioc::{Container, Lifetime};
use std::sync::Arc;

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("sync_resolve_single", |b| {
        struct A;

        fn new_a() -> A {
            A
        }

        let container = Container::new();
        b.iter(|| container.resolve(new_a).unwrap());
    })
    .bench_function("sync_resolve_many", |b| {
        struct A(Arc<B>, Arc<C>);
        struct B(i32);
        struct C(Arc<CA>);
        struct CA(Arc<CAA>);
        struct CAA(Arc<CAAA>);
        struct CAAA;

        fn new_b() -> B {
            B(2)
        }

        fn new_caaa() -> CAAA {
            CAAA
        }

        let container = Container::new();
        let new_a = {
            let container = container.clone();
            move || {
                let c = container.inject(
                    |caa: Arc<CAA>| C(Arc::new(CA(caa))),
                    ({
                        let container = container.clone();
                        move || container.inject(CAA, (new_caaa,)).unwrap()
                    },),
                );
                A(container.resolve(new_b).unwrap(), Arc::new(c.unwrap()))
            }
        };
        b.iter(|| container.resolve(new_a.clone()).unwrap());
    })
    .bench_function("sync_resolve_transient_single", |b| {
        struct A;

        fn new_a() -> A {
            A
        }

        let container = Container::new();
        b.iter(|| container.resolve_transient(new_a).unwrap());
    })
    .bench_function("sync_resolve_scoped_single", |b| {
        struct A;

        fn new_a() -> A {
            A
        }

        let container = Container::new();
        let _scope = container.begin_scope();
        b.iter(|| container.resolve_with(new_a, Lifetime::Scoped).unwrap());
    })
    .bench_function("sync_scope_begin_end", |b| {
        struct A;

        fn new_a() -> A {
            A
        }

        let container = Container::new();
        b.iter(|| {
            container.with_scope(|| container.resolve_with(new_a, Lifetime::Scoped).unwrap());
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
