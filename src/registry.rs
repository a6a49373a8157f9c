//! Registrations and the registry they are collected in

use crate::{
    component::{wiring::Construction, Component, RefDecl},
    error::{Error, RegistrationError},
    identity::{Identity, TypeIdMap, TypeInfo},
    runtime::Instance
};
use std::{
    any::type_name,
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError}
};

type ConstructFn = Box<
    dyn Fn(&mut Construction<'_>) -> Result<Instance, Error>
    + Send
    + Sync
>;

type ErasedHook = Arc<
    dyn Fn(&Instance, &str) -> Instance
    + Send
    + Sync
>;

/// Interception hook applied to every instance of the interface `I`
/// handed out by an interface lookup, along with the name of the requester
pub type Hook<I> = Arc<
    dyn Fn(Arc<I>, &str) -> Arc<I>
    + Send
    + Sync
>;

/// Options of a single registration
pub struct Options<I: ?Sized> {
    singleton: bool,
    hook: Option<Hook<I>>
}

impl<I: ?Sized> Default for Options<I> {
    #[inline]
    fn default() -> Self {
        Self {
            singleton: false,
            hook: None
        }
    }
}

impl<I: ?Sized> fmt::Debug for Options<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("singleton", &self.singleton)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

impl<I: ?Sized> Options<I> {
    /// Creates default options: not a singleton, no hook
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the registration as the only one allowed for its interface
    #[inline]
    pub fn singleton(mut self) -> Self {
        self.singleton = true;
        self
    }

    /// Wraps every instance handed out by interface lookups.
    ///
    /// The hook receives the canonical cached instance and the name of the
    /// requester: the owning dependency for reference wiring, or
    /// [`ROOT_REQUESTER`](crate::runtime::ROOT_REQUESTER) for direct lookups.
    /// The cached instance itself is never replaced.
    #[inline]
    pub fn hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<I>, &str) -> Arc<I> + Send + Sync + 'static
    {
        self.hook = Some(Arc::new(hook));
        self
    }
}

/// A registration: the relationship between an interface and its implementation
pub struct Dep {
    identity: Identity,
    interface: TypeInfo,
    implementation: TypeInfo,
    singleton: bool,
    hook: Option<ErasedHook>,
    refs: Vec<RefDecl>,
    construct: ConstructFn
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dep")
            .field("id", &self.identity.id)
            .field("name", &self.identity.name)
            .field("interface", &self.interface)
            .field("implementation", &self.implementation)
            .field("singleton", &self.singleton)
            .field("hook", &self.hook.is_some())
            .field("refs", &self.refs)
            .finish()
    }
}

impl Dep {
    /// Creates the registration of the implementation `X` of the interface `I`
    pub fn new<I, X>(options: Options<I>) -> Result<Self, Error>
    where
        I: ?Sized + Send + Sync + 'static,
        X: Component<Interface = I>
    {
        let wiring = X::wiring();
        let interface = TypeInfo::of::<I>();
        let implementation = TypeInfo::of::<X>();
        let identity = Identity::resolve(interface, implementation, wiring.name())?;
        let refs = wiring.references().collect();

        let hook = options.hook.map(|hook| -> ErasedHook {
            Arc::new(move |instance: &Instance, requester: &str| {
                match instance.downcast_interface::<I>() {
                    Some(value) => Instance::from_interface(hook(value, requester)),
                    None => instance.clone()
                }
            })
        });

        Ok(Self {
            identity,
            interface,
            implementation,
            singleton: options.singleton,
            hook,
            refs,
            construct: Box::new(move |cx: &mut Construction<'_>| wiring.construct(cx))
        })
    }

    /// Globally unique id
    #[inline]
    pub fn id(&self) -> &str {
        &self.identity.id
    }

    /// Human-readable name, also the primary config section key
    #[inline]
    pub fn name(&self) -> &str {
        &self.identity.name
    }

    /// Interface type
    #[inline]
    pub fn interface(&self) -> TypeInfo {
        self.interface
    }

    /// Implementation type
    #[inline]
    pub fn implementation(&self) -> TypeInfo {
        self.implementation
    }

    /// Checks whether the registration is marked as singleton
    #[inline]
    pub fn is_singleton(&self) -> bool {
        self.singleton
    }

    /// Checks whether this is the anonymous dependency of its interface
    #[inline]
    pub fn is_anonymous(&self) -> bool {
        self.identity.is_anonymous()
    }

    /// References declared by the implementation
    #[inline]
    pub fn references(&self) -> &[RefDecl] {
        &self.refs
    }

    fn verify(&self) -> Result<(), RegistrationError> {
        if !self.interface.is_interface() {
            return Err(RegistrationError::NotInterface(self.interface.name()));
        }
        if !self.implementation.is_struct() {
            return Err(RegistrationError::NotStruct(self.implementation.name()));
        }
        if self.identity.id.is_empty() {
            return Err(RegistrationError::MissingId);
        }
        if self.identity.name.is_empty() {
            return Err(RegistrationError::MissingName);
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn construct(&self, cx: &mut Construction<'_>) -> Result<Instance, Error> {
        (self.construct)(cx)
    }

    #[inline]
    pub(crate) fn intercept(&self, instance: Instance, requester: &str) -> Instance {
        match &self.hook {
            Some(hook) => hook(&instance, requester),
            None => instance
        }
    }
}

#[derive(Default)]
struct Entries {
    order: Vec<Arc<Dep>>,
    by_id: HashMap<String, Arc<Dep>>,
    by_intf: TypeIdMap<Vec<Arc<Dep>>>
}

/// Insert-only table of registrations, indexed by id and by interface.
///
/// One composition root collects every registration here and hands the
/// result to [`Runtime::new`](crate::Runtime::new).
///
/// # Example
/// ```ignore
/// let registry = Registry::new();
/// registry.register::<dyn Greeter, PlainGreeter>(Options::new())?;
/// registry.register::<dyn Greeter, FormalGreeter>(Options::new())?;
/// ```
#[derive(Default)]
pub struct Registry {
    entries: Mutex<Entries>
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.all_deps())
            .finish()
    }
}

impl Registry {
    /// Creates an empty registry
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the implementation `X` of the interface `I`
    pub fn register<I, X>(&self, options: Options<I>) -> Result<(), Error>
    where
        I: ?Sized + Send + Sync + 'static,
        X: Component<Interface = I>
    {
        let dep = Dep::new::<I, X>(options)?;
        self.insert(dep)
            .map_err(|err| {
                tracing::error!(implementation = type_name::<X>(), error = %err, "registration rejected");
                Error::Registration(err)
            })
    }

    /// Registers the implementation `X` of the interface `I`
    ///
    /// # Panics
    /// If the registration is rejected
    pub fn must_register<I, X>(&self, options: Options<I>)
    where
        I: ?Sized + Send + Sync + 'static,
        X: Component<Interface = I>
    {
        if let Err(err) = self.register::<I, X>(options) {
            panic!("{err}");
        }
    }

    /// Adds a registration built with [`Dep::new`]
    pub fn insert(&self, dep: Dep) -> Result<(), RegistrationError> {
        dep.verify()?;

        let mut entries = self.lock();
        if let Some(existing) = entries.by_id.get(dep.id()) {
            return Err(RegistrationError::DuplicateId {
                id: dep.id().to_owned(),
                existing: existing.implementation().name(),
                implementation: dep.implementation().name()
            });
        }

        if let Some(registered) = entries.by_intf.get(&dep.interface().id()) {
            if let Some(taken) = registered.iter().find(|existing| dep.singleton || existing.singleton) {
                return Err(RegistrationError::DuplicateSingleton {
                    name: taken.name().to_owned(),
                    implementation: dep.implementation().name()
                });
            }
        }

        let dep = Arc::new(dep);
        entries.by_intf
            .entry(dep.interface().id())
            .or_default()
            .push(dep.clone());
        entries.by_id.insert(dep.id().to_owned(), dep.clone());
        entries.order.push(dep);
        Ok(())
    }

    /// Returns the registrations of the interface and whether there are any
    pub fn search(&self, interface: TypeInfo) -> (Vec<Arc<Dep>>, bool) {
        match self.lock().by_intf.get(&interface.id()) {
            Some(deps) => (deps.clone(), true),
            None => (Vec::new(), false)
        }
    }

    /// Returns a snapshot of all registrations in registration order
    pub fn all_deps(&self) -> Vec<Arc<Dep>> {
        self.lock().order.clone()
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
