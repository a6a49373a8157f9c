//! # Wiring
//!
//! > Dependency injection runtime for Rust: components implement interfaces,
//! > declare their configuration, logger and references as fields,
//! > and are constructed lazily, exactly once per runtime.
//!
//! ## Features
//! * Anonymous and named implementations of one interface
//! * Strict TOML configuration sections per component
//! * Reference wiring with whole-graph validation up front
//! * Fakes, pre-supplied instances and interception hooks for tests
//! * Runs on stable Rust 1.80+
//!
//! ## Example
//! ```toml
//! [dependencies]
//! wiring = "0.1.0"
//! tokio = { version = "1", features = ["full"] }
//! ```
//! ```no_run
//! use std::sync::Arc;
//! use wiring::*;
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self, name: &str) -> String;
//! }
//!
//! #[derive(Default, Component)]
//! struct PlainGreeter {
//!     base: Implements<dyn Greeter>
//! }
//!
//! impl Greeter for PlainGreeter {
//!     fn greet(&self, name: &str) -> String {
//!         format!("hello {name}")
//!     }
//! }
//!
//! #[derive(Default, Component)]
//! struct App {
//!     base: Implements<dyn Main>,
//!     greeter: Ref<dyn Greeter>
//! }
//!
//! impl Main for App {}
//!
//! #[tokio::main]
//! async fn main() -> Result<(), BoxError> {
//!     let registry = Registry::new();
//!     registry.register::<dyn Main, App>(Options::new())?;
//!     registry.register::<dyn Greeter, PlainGreeter>(Options::new())?;
//!
//!     run::<App, _, _>(CancellationToken::new(), &registry, RuntimeConfig::new(), |_, app| async move {
//!         println!("{}", app.greeter.greet("world"));
//!         Ok(())
//!     }).await
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(unreachable_pub)]

extern crate self as wiring;

pub mod component;
pub mod config;
pub mod error;
pub mod identity;
pub mod log;
pub mod registry;
pub mod run;
pub mod runtime;
pub mod testing;
pub mod validate;

pub use crate::{
    component::{Component, Implements, Ref, RefDecl, Wiring},
    config::{Config, Sections, Settings, Validate},
    error::{BoxError, Error},
    identity::{Identity, TypeInfo},
    log::Logger,
    registry::{Dep, Options, Registry},
    run::{run, Main},
    runtime::{Instance, Runtime, RuntimeConfig},
    validate::validate_deps
};

pub use tokio_util::sync::CancellationToken;

#[cfg(feature = "macros")]
pub use wiring_macros::Component;
