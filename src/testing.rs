//! Harness running a test body against a fresh runtime
//!
//! # Example
//! ```ignore
//! use wiring::testing::{self, Intf};
//!
//! #[test]
//! fn it_greets() {
//!     let config = RuntimeConfig::new().with_fake::<dyn Clock>(Arc::new(FixedClock));
//!
//!     testing::test(&registry(), config, |greeter: Intf<dyn Greeter>| {
//!         assert_eq!(greeter.greet("world"), "hello world");
//!     });
//! }
//! ```

use crate::{
    error::Error,
    registry::Registry,
    runtime::{Runtime, RuntimeConfig}
};
use tokio_util::sync::CancellationToken;

pub use self::{
    body::TestBody,
    from_runtime::{FromRuntime, Impl, Intf}
};

pub mod body;
pub mod from_runtime;

/// Runs `body` with parameters resolved from a fresh runtime over `registry`.
///
/// The runtime gets its own cancellation token, cancelled once the body returns.
///
/// # Panics
/// If the runtime cannot be created or a parameter cannot be resolved
#[track_caller]
pub fn test<Args, B>(registry: &Registry, config: RuntimeConfig, body: B)
where
    Args: FromRuntime,
    B: TestBody<Args>
{
    if let Err(err) = try_test(registry, config, body) {
        panic!("{err}");
    }
}

/// Runs a benchmark `body` with parameters resolved from a fresh runtime.
///
/// The body receives the benchmark driver (e.g. a `criterion::Criterion`)
/// together with the resolved parameters, so the measured routine reuses
/// instances that are already constructed.
///
/// # Example
/// ```ignore
/// fn benchmark(c: &mut Criterion) {
///     testing::bench(c, &registry(), RuntimeConfig::new(), |c, greeter: Intf<dyn Greeter>| {
///         c.bench_function("greet", |b| b.iter(|| greeter.greet("world")));
///     });
/// }
/// ```
///
/// # Panics
/// If the runtime cannot be created or a parameter cannot be resolved
#[track_caller]
pub fn bench<C, Args, F>(driver: &mut C, registry: &Registry, config: RuntimeConfig, body: F)
where
    C: ?Sized,
    Args: FromRuntime,
    F: FnOnce(&mut C, Args)
{
    if let Err(err) = try_test::<(Args,), _>(registry, config, |args: Args| body(driver, args)) {
        panic!("{err}");
    }
}

/// Fallible form of [`test`]
pub fn try_test<Args, B>(registry: &Registry, config: RuntimeConfig, body: B) -> Result<(), Error>
where
    Args: FromRuntime,
    B: TestBody<Args>
{
    let ctx = CancellationToken::new();
    let _guard = ctx.clone().drop_guard();

    let runtime = Runtime::new(ctx, registry.all_deps(), config)?;
    let args = Args::from_runtime(&runtime)?;
    body.call(args);
    Ok(())
}
