use std::hint::black_box;
use criterion::{criterion_group, criterion_main, Criterion};
use wiring::{
    testing::{self, Intf},
    CancellationToken, Component, Implements, Options, Ref, Registry, Runtime, RuntimeConfig
};

trait Store: Send + Sync {}
trait Service: Send + Sync {}

#[derive(Default, Component)]
struct Memory {
    base: Implements<dyn Store>
}

impl Store for Memory {}

#[derive(Default, Component)]
struct App {
    #[component(name = "app")]
    base: Implements<dyn Service>,
    store: Ref<dyn Store>
}

impl Service for App {}

fn registry() -> Registry {
    let registry = Registry::new();
    registry.must_register::<dyn Store, Memory>(Options::new());
    registry.must_register::<dyn Service, App>(Options::new());
    registry
}

fn benchmark(c: &mut Criterion) {
    let registry = registry();

    testing::bench(c, &registry, RuntimeConfig::new(), |c, (_, runtime): (Intf<dyn Store>, Runtime)| {
        runtime.get_intf::<dyn Service>("app").unwrap();

        c.bench_function("cached_intf", |b| b.iter(|| {
            black_box(runtime.get_intf::<dyn Service>(black_box("app")).unwrap());
        }));

        c.bench_function("cached_impl", |b| b.iter(|| {
            black_box(runtime.get_impl::<Memory>().unwrap());
        }));
    });

    c.bench_function("cold_graph", |b| b.iter(|| {
        let runtime = Runtime::new(CancellationToken::new(), registry.all_deps(), RuntimeConfig::new()).unwrap();
        black_box(runtime.get_intf::<dyn Service>("app").unwrap());
    }));
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
