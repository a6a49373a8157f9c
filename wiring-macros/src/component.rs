//! Macros for components

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    spanned::Spanned,
    Attribute, Data, DeriveInput, Error, Fields, GenericArgument, Ident, LitStr,
    PathArguments, Result, Type, TypePath
};

const ATTR: &str = "component";

/// Role of a field in the construction of a component
enum FieldKind {
    Implements,
    Config,
    Logger,
    Ref,
    Other
}

impl FieldKind {
    /// Detects the role of a field by its type.
    ///
    /// Holders are matched when named directly (`Config<T>`) or through
    /// the `wiring` crate (`wiring::Config<T>`), with generic arguments on
    /// `Implements`, `Config` and `Ref` and none on `Logger`.
    /// Any other type is an ordinary field.
    fn of(ty: &Type) -> Self {
        let Type::Path(TypePath { qself: None, path }) = ty else {
            return FieldKind::Other;
        };
        let (Some(first), Some(last)) = (path.segments.first(), path.segments.last()) else {
            return FieldKind::Other;
        };
        if path.segments.len() > 1 && first.ident != "wiring" {
            return FieldKind::Other;
        }

        let generic = matches!(last.arguments, PathArguments::AngleBracketed(_));
        match (last.ident.to_string().as_str(), generic) {
            ("Implements", true) => FieldKind::Implements,
            ("Config", true) => FieldKind::Config,
            ("Ref", true) => FieldKind::Ref,
            ("Logger", false) => FieldKind::Logger,
            _ => FieldKind::Other
        }
    }
}

/// `#[component(...)]` arguments of a field
#[derive(Default)]
struct FieldArgs {
    name: Option<LitStr>,
    section: Option<LitStr>
}

impl FieldArgs {
    fn parse(attrs: &[Attribute]) -> Result<Self> {
        let mut args = FieldArgs::default();
        for attr in attrs.iter().filter(|attr| attr.path().is_ident(ATTR)) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    args.name = Some(meta.value()?.parse()?);
                    Ok(())
                } else if meta.path.is_ident("section") {
                    args.section = Some(meta.value()?.parse()?);
                    Ok(())
                } else {
                    Err(meta.error("expected `name` or `section`"))
                }
            })?;
        }
        Ok(args)
    }
}

/// `#[component(...)]` arguments of the struct
#[derive(Default)]
struct StructArgs {
    init: Option<Ident>
}

impl StructArgs {
    fn parse(attrs: &[Attribute]) -> Result<Self> {
        let mut args = StructArgs::default();
        for attr in attrs.iter().filter(|attr| attr.path().is_ident(ATTR)) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("init") {
                    args.init = Some(meta.value()?.parse()?);
                    Ok(())
                } else {
                    Err(meta.error("expected `init`"))
                }
            })?;
        }
        Ok(args)
    }
}

/// Extracts `I` from `Implements<I>`
fn interface_of(ty: &Type) -> Result<&Type> {
    if let Type::Path(path) = ty {
        if let Some(segment) = path.path.segments.last() {
            if let PathArguments::AngleBracketed(args) = &segment.arguments {
                if let Some(GenericArgument::Type(interface)) = args.args.first() {
                    return Ok(interface);
                }
            }
        }
    }
    Err(Error::new(ty.span(), "expected `Implements<dyn Interface>`"))
}

/// Expands a derive-macro for `Component`
pub(super) fn expand_component(input: &DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(Error::new(input.generics.span(), "generic components are not supported"));
    }

    let Data::Struct(data) = &input.data else {
        return Err(Error::new(input.span(), "`Component` can only be derived for structs"));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(Error::new(data.fields.span(), "`Component` requires named fields"));
    };

    let struct_args = StructArgs::parse(&input.attrs)?;

    let mut implements = None;
    let mut config = false;
    let mut logger = false;
    let mut accessors = Vec::new();
    let mut steps = Vec::new();

    for field in &fields.named {
        let Some(ident) = &field.ident else {
            continue;
        };
        let ty = &field.ty;
        let args = FieldArgs::parse(&field.attrs)?;
        let accessor = format_ident!("__{}", ident);
        let field_name = LitStr::new(&ident.to_string(), ident.span());

        match FieldKind::of(ty) {
            FieldKind::Implements => {
                if implements.is_some() {
                    return Err(Error::new(field.span(), "only one `Implements` field is allowed"));
                }
                if let Some(section) = &args.section {
                    return Err(Error::new(section.span(), "`section` is only allowed on a `Config` field"));
                }
                implements = Some((interface_of(ty)?, accessor.clone(), args.name));
            }
            FieldKind::Config => {
                if config {
                    return Err(Error::new(field.span(), "only one `Config` field is allowed"));
                }
                if let Some(name) = &args.name {
                    return Err(Error::new(name.span(), "`name` is not allowed on a `Config` field"));
                }
                steps.push(quote! { .config(#accessor) });
                if let Some(section) = &args.section {
                    steps.push(quote! { .section(#section) });
                }
                config = true;
            }
            FieldKind::Logger => {
                if logger {
                    return Err(Error::new(field.span(), "only one `Logger` field is allowed"));
                }
                steps.push(quote! { .logger(#accessor) });
                logger = true;
            }
            FieldKind::Ref => {
                if let Some(section) = &args.section {
                    return Err(Error::new(section.span(), "`section` is only allowed on a `Config` field"));
                }
                let target = match &args.name {
                    Some(target) => quote! { #target },
                    None => quote! { "" }
                };
                steps.push(quote! { .named_reference(#field_name, #target, #accessor) });
            }
            FieldKind::Other => continue
        }

        accessors.push(quote! {
            fn #accessor(component: &mut #name) -> &mut #ty {
                &mut component.#ident
            }
        });
    }

    let Some((interface, implements, tag)) = implements else {
        return Err(Error::new(name.span(), "`Component` requires an `Implements<dyn Interface>` field"));
    };
    let tag = tag.map(|tag| quote! { .named(#tag) });

    let init = struct_args.init.map(|method| quote! {
        #[inline]
        fn init(&self, ctx: &::wiring::CancellationToken) -> ::std::result::Result<(), ::wiring::BoxError> {
            self.#method(ctx)
        }
    });

    Ok(quote! {
        impl ::wiring::Component for #name {
            type Interface = #interface;

            fn wiring() -> ::wiring::Wiring<Self> {
                #(#accessors)*

                ::wiring::Wiring::<Self>::new(#implements)
                    #tag
                    #(#steps)*
            }

            #[inline]
            fn into_interface(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<Self::Interface> {
                self
            }

            #init
        }
    })
}

#[cfg(test)]
mod tests {
    use super::expand_component;
    use syn::parse_str;

    fn expand(source: &str) -> syn::Result<String> {
        let input = parse_str(source).unwrap();
        expand_component(&input).map(|tokens| tokens.to_string())
    }

    #[test]
    fn it_expands_marker_and_references() {
        let output = expand(r#"
            struct Formal {
                #[component(name = "formal")]
                base: Implements<dyn Greeter>,
                config: wiring::Config<FormalConfig>,
                #[component(name = "disk")]
                store: Ref<dyn Store>,
                counter: usize,
            }
        "#).unwrap();

        assert!(output.contains("type Interface = dyn Greeter"));
        assert!(output.contains(". named (\"formal\")"));
        assert!(output.contains(". config (__config)"));
        assert!(output.contains(". named_reference (\"store\" , \"disk\" , __store)"));
        assert!(!output.contains("counter ("));
        assert!(!output.contains("fn init"));
    }

    #[test]
    fn it_expands_section_and_init() {
        let output = expand(r#"
            #[component(init = start)]
            struct Foo {
                base: Implements<dyn Foo>,
                #[component(section = "fooB")]
                config: Config<FooConfig>,
                log: Logger,
            }
        "#).unwrap();

        assert!(output.contains(". section (\"fooB\")"));
        assert!(output.contains(". logger (__log)"));
        assert!(output.contains("self . start (ctx)"));
    }

    #[test]
    fn it_skips_foreign_types_with_holder_names() {
        let output = expand(r#"
            struct Foo {
                base: Implements<dyn Foo>,
                settings: figment::Config<FooConfig>,
                raw: Config,
                log: Logger<Json>,
                peer: net::Ref<Peer>,
            }
        "#).unwrap();

        assert!(!output.contains(". config ("));
        assert!(!output.contains(". logger ("));
        assert!(!output.contains("named_reference"));
        assert!(!output.contains("__settings"));
    }

    #[test]
    fn it_accepts_holders_through_crate_path() {
        let output = expand(r#"
            struct Foo {
                base: ::wiring::Implements<dyn Foo>,
                log: wiring::log::Logger,
                peer: wiring::Ref<dyn Peer>,
            }
        "#).unwrap();

        assert!(output.contains("type Interface = dyn Foo"));
        assert!(output.contains(". logger (__log)"));
        assert!(output.contains(". named_reference (\"peer\" , \"\" , __peer)"));
    }

    #[test]
    fn it_requires_implements() {
        let err = expand("struct Foo { config: Config<FooConfig> }").unwrap_err();

        assert!(err.to_string().contains("requires an `Implements"));
    }

    #[test]
    fn it_rejects_second_implements() {
        let err = expand("struct Foo { a: Implements<dyn A>, b: Implements<dyn B> }").unwrap_err();

        assert!(err.to_string().contains("only one `Implements`"));
    }

    #[test]
    fn it_rejects_generics() {
        let err = expand("struct Foo<T> { base: Implements<dyn A>, value: T }").unwrap_err();

        assert!(err.to_string().contains("generic components"));
    }

    #[test]
    fn it_rejects_unknown_attribute() {
        let err = expand(r#"
            struct Foo {
                #[component(alias = "x")]
                base: Implements<dyn A>,
            }
        "#).unwrap_err();

        assert!(err.to_string().contains("expected `name` or `section`"));
    }
}
