use std::sync::Arc;
use wiring::{
    testing::{self, Impl, Intf},
    BoxError, CancellationToken, Component, Error, Implements, Options, Ref,
    Registry, Runtime, RuntimeConfig
};

trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

trait Greeter: Send + Sync {
    fn greet(&self, name: &str) -> String;
}

#[derive(Default, Component)]
#[component(init = start)]
struct SystemClock {
    base: Implements<dyn Clock>
}

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        7
    }
}

impl SystemClock {
    fn start(&self, ctx: &CancellationToken) -> Result<(), BoxError> {
        if ctx.is_cancelled() {
            return Err("cancelled".into());
        }
        Ok(())
    }
}

#[derive(Default, Component)]
struct TimedGreeter {
    base: Implements<dyn Greeter>,
    clock: Ref<dyn Clock>
}

impl Greeter for TimedGreeter {
    fn greet(&self, name: &str) -> String {
        format!("hello {name} at {}", self.clock.now())
    }
}

struct FixedClock(u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

fn registry() -> Registry {
    let registry = Registry::new();
    registry.must_register::<dyn Clock, SystemClock>(Options::new());
    registry.must_register::<dyn Greeter, TimedGreeter>(Options::new());
    registry
}

#[test]
fn it_runs_body_with_interfaces() {
    testing::test(&registry(), RuntimeConfig::new(), |greeter: Intf<dyn Greeter>| {
        assert_eq!(greeter.greet("ann"), "hello ann at 7");
    });
}

#[test]
fn it_runs_body_with_fakes() {
    let config = RuntimeConfig::new().with_fake::<dyn Clock>(Arc::new(FixedClock(12)));

    testing::test(&registry(), config, |greeter: Intf<dyn Greeter>, clock: Intf<dyn Clock>| {
        assert_eq!(clock.now(), 12);
        assert_eq!(greeter.greet("ann"), "hello ann at 12");
    });
}

#[test]
fn it_runs_body_with_implementations() {
    testing::test(
        &registry(),
        RuntimeConfig::new(),
        |greeter: Impl<TimedGreeter>, clock: Intf<dyn Clock>, runtime: Runtime, ctx: CancellationToken| {
            assert!(Arc::ptr_eq(greeter.clock.get(), &clock.into_inner()));
            assert!(runtime.is_resolved("harness::Clock"));
            assert!(!ctx.is_cancelled());
        }
    );
}

#[test]
fn it_runs_body_without_parameters() {
    let mut called = false;

    testing::test(&registry(), RuntimeConfig::new(), || called = true);

    assert!(called);
}

#[test]
fn it_cancels_context_after_body() {
    let mut token = None;

    testing::test(&registry(), RuntimeConfig::new(), |ctx: CancellationToken| {
        token = Some(ctx);
    });

    assert!(token.unwrap().is_cancelled());
}

#[test]
fn it_runs_bench_body_with_driver() {
    struct Driver {
        iterations: usize
    }

    let mut driver = Driver { iterations: 0 };

    testing::bench(
        &mut driver,
        &registry(),
        RuntimeConfig::new(),
        |driver: &mut Driver, (greeter, clock): (Intf<dyn Greeter>, Intf<dyn Clock>)| {
            for _ in 0..3 {
                assert_eq!(greeter.greet("ann"), format!("hello ann at {}", clock.now()));
                driver.iterations += 1;
            }
        }
    );

    assert_eq!(driver.iterations, 3);
}

#[test]
#[should_panic(expected = "was not registered")]
fn it_panics_on_invalid_bench_graph() {
    let registry = Registry::new();
    registry.must_register::<dyn Greeter, TimedGreeter>(Options::new());

    testing::bench(&mut (), &registry, RuntimeConfig::new(), |_: &mut (), _: Runtime| {});
}

#[test]
fn it_reports_unresolvable_parameters() {
    let err = testing::try_test(&Registry::new(), RuntimeConfig::new(), |_: Intf<dyn Greeter>| {
        unreachable!();
    }).unwrap_err();

    assert!(matches!(err, Error::IntfNotFound { .. }));
}

#[test]
#[should_panic(expected = "was not registered")]
fn it_panics_on_invalid_graph() {
    let registry = Registry::new();
    registry.must_register::<dyn Greeter, TimedGreeter>(Options::new());

    testing::test(&registry, RuntimeConfig::new(), || {});
}
