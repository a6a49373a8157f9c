//! Entry point of a program built from components

use crate::{
    component::Component,
    error::BoxError,
    registry::Registry,
    runtime::{Runtime, RuntimeConfig}
};
use tokio_util::sync::CancellationToken;
use std::{future::Future, sync::Arc};

/// Conventional interface of the root component started by [`run`]
pub trait Main: Send + Sync {}

/// Builds a runtime over every registration of `registry`, resolves the root
/// component `X` and awaits `start` with it.
///
/// # Example
/// ```ignore
/// #[derive(Default, Component)]
/// struct App {
///     base: Implements<dyn Main>,
///     greeter: Ref<dyn Greeter>
/// }
///
/// impl Main for App {}
///
/// #[tokio::main]
/// async fn main() -> Result<(), BoxError> {
///     let registry = Registry::new();
///     registry.register::<dyn Main, App>(Options::new())?;
///     registry.register::<dyn Greeter, PlainGreeter>(Options::new())?;
///
///     wiring::run::<App, _, _>(CancellationToken::new(), &registry, RuntimeConfig::new(), |_, app| async move {
///         println!("{}", app.greeter.greet("world"));
///         Ok(())
///     }).await
/// }
/// ```
pub async fn run<X, F, Fut>(
    ctx: CancellationToken,
    registry: &Registry,
    config: RuntimeConfig,
    start: F
) -> Result<(), BoxError>
where
    X: Component<Interface = dyn Main>,
    F: FnOnce(CancellationToken, Arc<X>) -> Fut,
    Fut: Future<Output = Result<(), BoxError>>
{
    let runtime = Runtime::new(ctx.clone(), registry.all_deps(), config)?;
    let root = runtime.get_impl::<X>()?;

    tracing::info!(root = std::any::type_name::<X>(), "starting");
    start(ctx, root).await
}

#[cfg(test)]
mod tests {
    use super::{run, Main};
    use crate::{
        component::{Component, Implements, Wiring},
        error::BoxError,
        registry::{Options, Registry},
        runtime::RuntimeConfig
    };
    use tokio_util::sync::CancellationToken;
    use std::sync::Arc;

    #[derive(Default)]
    struct App {
        base: Implements<dyn Main>
    }

    impl Main for App {}

    impl Component for App {
        type Interface = dyn Main;

        fn wiring() -> Wiring<Self> {
            Wiring::<Self>::new(|c| &mut c.base)
        }

        fn into_interface(self: Arc<Self>) -> Arc<dyn Main> {
            self
        }
    }

    #[tokio::test]
    async fn it_starts_root_component() {
        let registry = Registry::new();
        registry.register::<dyn Main, App>(Options::new()).unwrap();

        let result = run::<App, _, _>(CancellationToken::new(), &registry, RuntimeConfig::new(), |ctx, app| async move {
            assert!(!ctx.is_cancelled());
            assert!(app.base.runtime().is_some());
            Ok(())
        }).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn it_fails_without_root_registration() {
        let registry = Registry::new();

        let result = run::<App, _, _>(CancellationToken::new(), &registry, RuntimeConfig::new(), |_, _| async {
            Ok(())
        }).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn it_returns_start_error() {
        let registry = Registry::new();
        registry.register::<dyn Main, App>(Options::new()).unwrap();

        let result = run::<App, _, _>(CancellationToken::new(), &registry, RuntimeConfig::new(), |_, _| async {
            Err::<(), BoxError>("stopped".into())
        }).await;

        assert_eq!(result.unwrap_err().to_string(), "stopped");
    }
}
