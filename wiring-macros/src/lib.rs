//! Proc-Macros implementations for the wiring runtime
//!

use proc_macro::TokenStream;
use syn::parse_macro_input;

mod component;

/// Implements the `Component` trait by inspecting the fields of a struct.
///
/// Fields are recognized by their type:
/// * `Implements<dyn I>`: required, exactly one; declares the interface.
///   `#[component(name = "...")]` makes the component a named dependency.
/// * `Config<T>`: at most one; `#[component(section = "...")]` overrides
///   the alternate section key.
/// * `Logger`: at most one.
/// * `Ref<dyn I>`: any number; `#[component(name = "...")]` asks for a named dependency.
///
/// Holders must be written either unqualified, as imported from `wiring`, or
/// through a path starting with `wiring` (`wiring::Config<T>`). Renamed imports
/// and same-named types of other crates (`figment::Config<T>`) are not
/// recognized and count as ordinary fields.
///
/// Every other field is built with `Default`. A struct-level
/// `#[component(init = method)]` forwards `Component::init` to an inherent
/// `fn method(&self, &CancellationToken) -> Result<(), BoxError>`.
///
/// # Example
/// ```ignore
/// use wiring::{Component, Config, Implements, Logger, Ref};
///
/// #[derive(Default, Component)]
/// #[component(init = connect)]
/// struct FormalGreeter {
///     #[component(name = "formal")]
///     base: Implements<dyn Greeter>,
///     config: Config<GreeterConfig>,
///     logger: Logger,
///     store: Ref<dyn Store>,
/// }
/// ```
#[proc_macro_derive(Component, attributes(component))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as syn::DeriveInput);
    component::expand_component(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
