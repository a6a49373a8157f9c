//! Run with
//!
//! ```no_rust
//! RUST_LOG=debug cargo run --example simple
//! ```

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use wiring::{
    BoxError, CancellationToken, Component, Config, Implements, Logger, Main,
    Options, Ref, Registry, RuntimeConfig, Validate
};

trait Foo: Send + Sync {
    fn display(&self);
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct FooConfig {
    name: String
}

impl Validate for FooConfig {
    fn validate(&self) -> Result<(), BoxError> {
        if self.name.is_empty() {
            return Err("name is empty".into());
        }
        Ok(())
    }
}

/// Anonymous implementation, configured by the `['simple::Foo']` section
#[derive(Default, Component)]
struct PlainFoo {
    base: Implements<dyn Foo>,
    config: Config<FooConfig>,
    logger: Logger
}

impl Foo for PlainFoo {
    fn display(&self) {
        self.logger.in_scope(|| tracing::info!(name = %self.config.name, "foo"));
    }
}

#[derive(Default, Component)]
struct FooA {
    #[component(name = "fooA")]
    base: Implements<dyn Foo>,
    #[component(section = "fooA")]
    config: Config<FooConfig>
}

impl Foo for FooA {
    fn display(&self) {
        println!("fooA {}", self.config.name);
    }
}

#[derive(Default, Component)]
struct FooB {
    #[component(name = "fooB")]
    base: Implements<dyn Foo>,
    #[component(section = "foo-b")]
    config: Config<FooConfig>
}

impl Foo for FooB {
    fn display(&self) {
        println!("fooB {}", self.config.name);
    }
}

#[derive(Default, Component)]
struct App {
    base: Implements<dyn Main>,
    foo: Ref<dyn Foo>,
    #[component(name = "fooA")]
    foo_a: Ref<dyn Foo>,
    #[component(name = "fooB")]
    foo_b: Ref<dyn Foo>
}

impl Main for App {}

const CONFIG: &str = r#"
[fooB]
name = "xyz"

[fooA]
name = "abc"

['simple::Foo']
name = "foo"
"#;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let registry = Registry::new();
    registry.register::<dyn Main, App>(Options::new())?;
    registry.register::<dyn Foo, PlainFoo>(Options::new())?;
    registry.register::<dyn Foo, FooA>(Options::new())?;
    registry.register::<dyn Foo, FooB>(Options::new())?;

    let config = RuntimeConfig::new().with_toml(CONFIG);
    wiring::run::<App, _, _>(CancellationToken::new(), &registry, config, |_, app| async move {
        app.foo.display();
        app.foo_a.display();
        app.foo_b.display();

        let runtime = app.base
            .runtime()
            .ok_or("runtime is gone")?;

        runtime.get_intf::<dyn Foo>("")?.display();
        runtime.get_impl::<FooA>()?.display();
        Ok::<(), BoxError>(())
    }).await
}
