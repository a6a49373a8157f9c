//! Wiring descriptor of a component and its construction steps

use super::{Component, Implements, Ref};
use crate::{
    config::{Config, Settings, Sections},
    error::{ConfigError, Error},
    identity::TypeInfo,
    log::Logger,
    runtime::{Instance, WeakRuntime}
};
use tokio_util::sync::CancellationToken;
use std::{any::type_name, fmt};

type BindConfigFn<X> = Box<
    dyn Fn(&mut X, &Sections, &str, Option<&str>) -> Result<(), ConfigError>
    + Send
    + Sync
>;

type BindRefFn<X> = Box<
    dyn Fn(&mut X, &Instance)
    + Send
    + Sync
>;

/// A declared reference of a component: the interface it points at,
/// the name it asks for (empty for the anonymous dependency) and the field holding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefDecl {
    /// Target interface
    pub interface: TypeInfo,
    /// Target name, empty for the anonymous dependency
    pub name: &'static str,
    /// Field holding the reference
    pub field: &'static str
}

struct RefSlot<X> {
    decl: RefDecl,
    bind: BindRefFn<X>
}

/// Describes which fields of the component `X` take part in its construction.
///
/// Built once per registration; it replaces field introspection with explicit
/// accessors. The binding order is fixed: config, logger, runtime handle,
/// references, then [`Component::init`].
pub struct Wiring<X: Component> {
    implements: fn(&mut X) -> &mut Implements<X::Interface>,
    name: Option<&'static str>,
    config: Option<BindConfigFn<X>>,
    section: Option<&'static str>,
    logger: Option<fn(&mut X) -> &mut Logger>,
    refs: Vec<RefSlot<X>>
}

impl<X: Component> fmt::Debug for Wiring<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wiring")
            .field("implementation", &type_name::<X>())
            .field("name", &self.name)
            .field("config", &self.config.is_some())
            .field("section", &self.section)
            .field("logger", &self.logger.is_some())
            .field("refs", &self.references().collect::<Vec<_>>())
            .finish()
    }
}

impl<X: Component> Wiring<X> {
    /// Starts a descriptor from the accessor of the [`Implements`] marker
    #[inline]
    pub fn new(implements: fn(&mut X) -> &mut Implements<X::Interface>) -> Self {
        Self {
            implements,
            name: None,
            config: None,
            section: None,
            logger: None,
            refs: Vec::new()
        }
    }

    /// Tags the component with a name, making it a named dependency
    /// of its interface instead of the anonymous one
    #[inline]
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    /// Declares the configuration holder of the component
    pub fn config<T: Settings>(mut self, config: fn(&mut X) -> &mut Config<T>) -> Self {
        self.config = Some(Box::new(move |component: &mut X, sections: &Sections, primary: &str, alternate: Option<&str>| {
            config(component).bind(sections, primary, alternate)
        }));
        self
    }

    /// Overrides the alternate section key of the configuration holder
    #[inline]
    pub fn section(mut self, section: &'static str) -> Self {
        self.section = Some(section);
        self
    }

    /// Declares the logging holder of the component
    #[inline]
    pub fn logger(mut self, logger: fn(&mut X) -> &mut Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Declares a reference to the anonymous dependency of the interface `I`
    #[inline]
    pub fn reference<I>(self, field: &'static str, slot: fn(&mut X) -> &mut Ref<I>) -> Self
    where
        I: ?Sized + Send + Sync + 'static
    {
        self.named_reference(field, "", slot)
    }

    /// Declares a reference to the dependency of the interface `I` registered under `name`
    pub fn named_reference<I>(
        mut self,
        field: &'static str,
        name: &'static str,
        slot: fn(&mut X) -> &mut Ref<I>
    ) -> Self
    where
        I: ?Sized + Send + Sync + 'static
    {
        let decl = RefDecl {
            interface: TypeInfo::of::<I>(),
            name,
            field
        };
        let bind = Box::new(move |component: &mut X, instance: &Instance| {
            match instance.downcast_interface::<I>() {
                Some(value) => slot(component).set(value),
                None => panic!(
                    "value type assertion failed: {:?} is not {} when wiring {}.{field}",
                    instance,
                    type_name::<I>(),
                    type_name::<X>()
                )
            }
        });
        self.refs.push(RefSlot { decl, bind });
        self
    }

    /// Returns the tag name, if any
    #[inline]
    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    /// Iterates over the declared references
    #[inline]
    pub fn references(&self) -> impl Iterator<Item = RefDecl> + '_ {
        self.refs.iter().map(|slot| slot.decl)
    }

    /// Allocates and wires a new instance of `X`
    pub(crate) fn construct(&self, cx: &mut Construction<'_>) -> Result<Instance, Error> {
        let name = cx.name;
        let mut component = X::default();

        if let Some(bind) = &self.config {
            let alternate = self.section.unwrap_or(cx.interface.qualified_name());
            bind(&mut component, cx.sections, name, Some(alternate))
                .map_err(|source| Error::Config {
                    dep: name.to_owned(),
                    source
                })?;
        }

        if let Some(logger) = self.logger {
            *logger(&mut component) = cx.root.for_component(name);
        }

        (self.implements)(&mut component).attach(cx.runtime.clone());

        for slot in &self.refs {
            let instance = (cx.resolve)(slot.decl.interface, slot.decl.name)
                .map_err(|err| Error::Reference {
                    owner: type_name::<X>(),
                    field: slot.decl.field,
                    source: Box::new(err)
                })?;
            (slot.bind)(&mut component, &instance);
        }

        component
            .init(cx.ctx)
            .map_err(|source| Error::Lifecycle {
                dep: name.to_owned(),
                source
            })?;

        Ok(Instance::of(component))
    }
}

/// Everything a single construction needs from the runtime
pub(crate) struct Construction<'a> {
    pub(crate) name: &'a str,
    pub(crate) interface: TypeInfo,
    pub(crate) sections: &'a Sections,
    pub(crate) root: &'a Logger,
    pub(crate) runtime: WeakRuntime,
    pub(crate) ctx: &'a CancellationToken,
    pub(crate) resolve: &'a mut dyn FnMut(TypeInfo, &str) -> Result<Instance, Error>
}
