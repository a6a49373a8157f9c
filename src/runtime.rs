//! Resolution and construction engine

use crate::{
    component::{wiring::Construction, Component},
    config::Sections,
    error::{Error, RegistrationError},
    identity::{TypeIdMap, TypeInfo},
    log::Logger,
    registry::Dep,
    validate::validate_deps
};
use tokio_util::sync::CancellationToken;
use std::{
    any::type_name,
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak}
};

pub use self::instance::Instance;

pub mod instance;

/// Requester name reported to hooks for lookups made by callers of the runtime
pub const ROOT_REQUESTER: &str = "root";

/// Configuration bundle of a [`Runtime`]
///
/// # Example
/// ```ignore
/// let config = RuntimeConfig::new()
///     .with_toml(r#"
///         [formal]
///         style = "sir"
///     "#)
///     .with_fake::<dyn Clock>(Arc::new(FixedClock));
/// ```
#[derive(Default)]
pub struct RuntimeConfig {
    /// Raw TOML configuration document
    toml: String,

    /// Stand-ins for interfaces, bypassing construction entirely
    fakes: TypeIdMap<Instance>,

    /// Instances supplied up front, keyed by dependency id
    present: HashMap<String, Instance>,

    /// Root logger; defaults to the current span when the runtime is created
    root: Option<Logger>
}

impl fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("toml", &self.toml)
            .field("fakes", &self.fakes.len())
            .field("present", &self.present.keys().collect::<Vec<_>>())
            .field("root", &self.root)
            .finish()
    }
}

impl RuntimeConfig {
    /// Creates an empty configuration
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the TOML configuration document
    #[inline]
    pub fn with_toml(mut self, toml: impl Into<String>) -> Self {
        self.toml = toml.into();
        self
    }

    /// Replaces every lookup of the interface `I` with `fake`.
    ///
    /// Fakes skip configuration binding, reference wiring and the lifecycle hook.
    #[inline]
    pub fn with_fake<I>(mut self, fake: Arc<I>) -> Self
    where
        I: ?Sized + Send + Sync + 'static
    {
        self.fakes.insert(TypeInfo::of::<I>().id(), Instance::from_interface(fake));
        self
    }

    /// Supplies the instance of the dependency `id` instead of constructing it
    #[inline]
    pub fn with_present(mut self, id: impl Into<String>, instance: Instance) -> Self {
        self.present.insert(id.into(), instance);
        self
    }

    /// Sets the root logger
    #[inline]
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.root = Some(logger);
        self
    }
}

struct Inner {
    by_id: HashMap<String, Arc<Dep>>,
    by_intf: TypeIdMap<HashMap<String, Arc<Dep>>>,
    by_impl: TypeIdMap<Arc<Dep>>,

    ctx: CancellationToken,
    sections: Sections,
    fakes: TypeIdMap<Instance>,
    root: Logger,

    state: Mutex<State>
}

#[derive(Default)]
struct State {
    /// Fully constructed instances by dependency id
    impls: HashMap<String, Instance>,
    /// Ids whose construction is in progress, outermost first
    pending: Vec<String>
}

/// Builds and memoizes the instances of a registration set.
///
/// Every dependency is constructed at most once per runtime; repeated lookups
/// return the same object. A single lock guards the whole lookup and
/// construction path, including the recursive construction of references,
/// so concurrent callers are served one at a time.
///
/// Cloning is cheap and yields a handle to the same runtime.
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<Inner>
}

/// Non-owning handle to a [`Runtime`], held by constructed components
#[derive(Clone)]
pub(crate) struct WeakRuntime(Weak<Inner>);

impl WeakRuntime {
    #[inline]
    pub(crate) fn upgrade(&self) -> Option<Runtime> {
        self.0
            .upgrade()
            .map(|inner| Runtime { inner })
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("deps", &self.inner.by_id.len())
            .field("sections", &self.inner.sections.len())
            .finish()
    }
}

impl Runtime {
    /// Creates a runtime over `deps`.
    ///
    /// Validates the whole graph, splits the configuration document into
    /// sections and indexes the registrations. Nothing is constructed yet.
    pub fn new(ctx: CancellationToken, deps: Vec<Arc<Dep>>, config: RuntimeConfig) -> Result<Self, Error> {
        validate_deps(&deps)?;

        let sections = Sections::parse(&config.toml)
            .map_err(Error::Document)?;

        let mut by_id: HashMap<String, Arc<Dep>> = HashMap::with_capacity(deps.len());
        let mut by_intf: TypeIdMap<HashMap<String, Arc<Dep>>> = TypeIdMap::default();
        let mut by_impl: TypeIdMap<Arc<Dep>> = TypeIdMap::default();
        for dep in deps {
            if let Some(existing) = by_id.get(dep.id()) {
                return Err(RegistrationError::DuplicateId {
                    id: dep.id().to_owned(),
                    existing: existing.implementation().name(),
                    implementation: dep.implementation().name()
                }.into());
            }

            let named = by_intf
                .entry(dep.interface().id())
                .or_default();
            if named.contains_key(dep.name()) {
                return Err(RegistrationError::DuplicateName {
                    interface: dep.interface().name(),
                    name: dep.name().to_owned()
                }.into());
            }
            named.insert(dep.name().to_owned(), dep.clone());

            if by_impl.insert(dep.implementation().id(), dep.clone()).is_some() {
                return Err(RegistrationError::DuplicateImplementation(dep.implementation().name()).into());
            }

            by_id.insert(dep.id().to_owned(), dep);
        }

        if !config.present.is_empty() {
            tracing::debug!(count = config.present.len(), "seeding present values");
        }
        let state = State {
            impls: config.present,
            pending: Vec::new()
        };

        Ok(Self {
            inner: Arc::new(Inner {
                by_id,
                by_intf,
                by_impl,
                ctx,
                sections,
                fakes: config.fakes,
                root: config.root.unwrap_or_else(Logger::current),
                state: Mutex::new(state)
            })
        })
    }

    /// Returns the instance of the implementation `X`
    pub fn get_impl<X: Component>(&self) -> Result<Arc<X>, Error> {
        let instance = self.get_impl_by(TypeInfo::of::<X>())?;
        instance
            .downcast_implementation::<X>()
            .ok_or_else(|| Error::TypeMismatch {
                dep: instance.type_name().to_owned(),
                expected: type_name::<X>()
            })
    }

    /// Returns the dependency of the interface `I` registered under `name`,
    /// or the anonymous one when `name` is empty
    pub fn get_intf<I>(&self, name: &str) -> Result<Arc<I>, Error>
    where
        I: ?Sized + Send + Sync + 'static
    {
        let instance = self.get_intf_by(TypeInfo::of::<I>(), name)?;
        instance
            .downcast_interface::<I>()
            .ok_or_else(|| Error::TypeMismatch {
                dep: instance.type_name().to_owned(),
                expected: type_name::<I>()
            })
    }

    /// Type-erased form of [`Runtime::get_impl`]
    pub fn get_impl_by(&self, implementation: TypeInfo) -> Result<Instance, Error> {
        let dep = self.inner.by_impl
            .get(&implementation.id())
            .ok_or(Error::ImplNotFound(implementation.name()))?;

        let mut state = self.lock();
        self.get(&mut state, dep)
    }

    /// Type-erased form of [`Runtime::get_intf`]
    pub fn get_intf_by(&self, interface: TypeInfo, name: &str) -> Result<Instance, Error> {
        let mut state = self.lock();
        self.intf(&mut state, interface, name, ROOT_REQUESTER)
    }

    /// Returns the cancellation token handed to lifecycle hooks
    #[inline]
    pub fn context(&self) -> &CancellationToken {
        &self.inner.ctx
    }

    /// Returns the configuration sections of this runtime
    #[inline]
    pub fn sections(&self) -> &Sections {
        &self.inner.sections
    }

    /// Checks whether the dependency `id` has been constructed or supplied
    pub fn is_resolved(&self, id: &str) -> bool {
        self.lock()
            .impls
            .contains_key(id)
    }

    #[inline]
    fn downgrade(&self) -> WeakRuntime {
        WeakRuntime(Arc::downgrade(&self.inner))
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        let mut state = self.inner.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Left over only if a construction panicked
        state.pending.clear();
        state
    }

    fn intf(&self, state: &mut State, interface: TypeInfo, name: &str, requester: &str) -> Result<Instance, Error> {
        let deps = self.inner.by_intf
            .get(&interface.id())
            .ok_or_else(|| Error::IntfNotFound {
                interface: interface.name(),
                name: name.to_owned()
            })?;

        let dep = if name.is_empty() {
            deps.values()
                .find(|dep| dep.is_anonymous())
                .ok_or(Error::NoAnonymous(interface.name()))?
        } else {
            deps.get(name)
                .ok_or_else(|| Error::IntfNotFound {
                    interface: interface.name(),
                    name: name.to_owned()
                })?
        };

        let instance = self.get(state, dep)?;
        Ok(dep.intercept(instance, requester))
    }

    fn get(&self, state: &mut State, dep: &Arc<Dep>) -> Result<Instance, Error> {
        if let Some(instance) = state.impls.get(dep.id()) {
            tracing::debug!(dep = dep.name(), "resolved from cache");
            return Ok(instance.clone());
        }

        if let Some(fake) = self.inner.fakes.get(&dep.interface().id()) {
            tracing::debug!(dep = dep.name(), "resolved to fake");
            return Ok(fake.clone());
        }

        if state.pending.iter().any(|id| id == dep.id()) {
            let mut path = state.pending.clone();
            path.push(dep.id().to_owned());
            return Err(Error::Cycle(path));
        }

        tracing::debug!(dep = dep.name(), implementation = dep.implementation().name(), "constructing");
        state.pending.push(dep.id().to_owned());

        let result = {
            let mut resolve = |interface: TypeInfo, name: &str| {
                self.intf(state, interface, name, dep.name())
            };
            let mut cx = Construction {
                name: dep.name(),
                interface: dep.interface(),
                sections: &self.inner.sections,
                root: &self.inner.root,
                runtime: self.downgrade(),
                ctx: &self.inner.ctx,
                resolve: &mut resolve
            };
            dep.construct(&mut cx)
        };

        state.pending.pop();

        match result {
            Ok(instance) => {
                tracing::debug!(dep = dep.name(), "constructed");
                state.impls.insert(dep.id().to_owned(), instance.clone());
                Ok(instance)
            },
            Err(err) => {
                tracing::warn!(dep = dep.name(), error = %err, "construction failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        component::{Implements, Wiring},
        error::ConfigError,
        registry::{Options, Registry}
    };

    trait Store: Send + Sync {
        fn name(&self) -> &str;
    }

    #[derive(Default)]
    struct Memory {
        base: Implements<dyn Store>
    }

    impl Store for Memory {
        fn name(&self) -> &str {
            "memory"
        }
    }

    impl Component for Memory {
        type Interface = dyn Store;

        fn wiring() -> Wiring<Self> {
            Wiring::<Self>::new(|c| &mut c.base)
        }

        fn into_interface(self: Arc<Self>) -> Arc<dyn Store> {
            self
        }
    }

    struct Disk;

    impl Store for Disk {
        fn name(&self) -> &str {
            "disk"
        }
    }

    fn deps() -> Vec<Arc<Dep>> {
        let registry = Registry::new();
        registry.register::<dyn Store, Memory>(Options::new()).unwrap();
        registry.all_deps()
    }

    #[test]
    fn it_rejects_same_dep_twice() {
        let mut deps = deps();
        deps.push(deps[0].clone());

        let err = Runtime::new(CancellationToken::new(), deps, RuntimeConfig::new()).unwrap_err();

        assert!(matches!(err, Error::Registration(RegistrationError::DuplicateId { .. })));
    }

    #[test]
    fn it_rejects_invalid_document() {
        let config = RuntimeConfig::new().with_toml("answer = 42");

        let err = Runtime::new(CancellationToken::new(), deps(), config).unwrap_err();

        assert!(matches!(err, Error::Document(ConfigError::NotATable(_))));
    }

    #[test]
    fn it_constructs_lazily() {
        let runtime = Runtime::new(CancellationToken::new(), deps(), RuntimeConfig::new()).unwrap();
        assert!(!runtime.is_resolved("wiring::runtime::tests::Store"));

        let store = runtime.get_intf::<dyn Store>("").unwrap();

        assert_eq!(store.name(), "memory");
        assert!(runtime.is_resolved("wiring::runtime::tests::Store"));
    }

    #[test]
    fn it_prefers_fakes() {
        let config = RuntimeConfig::new().with_fake::<dyn Store>(Arc::new(Disk));
        let runtime = Runtime::new(CancellationToken::new(), deps(), config).unwrap();

        let store = runtime.get_intf::<dyn Store>("").unwrap();

        assert_eq!(store.name(), "disk");
        assert!(!runtime.is_resolved("wiring::runtime::tests::Store"));
    }

    #[test]
    fn it_prefers_present_values_over_fakes() {
        let config = RuntimeConfig::new()
            .with_fake::<dyn Store>(Arc::new(Disk))
            .with_present("wiring::runtime::tests::Store", Instance::of(Memory::default()));
        let runtime = Runtime::new(CancellationToken::new(), deps(), config).unwrap();

        assert_eq!(runtime.get_intf::<dyn Store>("").unwrap().name(), "memory");
        assert!(runtime.get_impl::<Memory>().is_ok());
    }

    #[test]
    fn it_attaches_runtime_handle() {
        let runtime = Runtime::new(CancellationToken::new(), deps(), RuntimeConfig::new()).unwrap();

        let memory = runtime.get_impl::<Memory>().unwrap();

        assert!(memory.base.runtime().is_some());
    }
}
