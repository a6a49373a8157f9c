//! Components and the holders placed inside them

use crate::{error::BoxError, runtime::{Runtime, WeakRuntime}};
use tokio_util::sync::CancellationToken;
use std::{
    any::type_name,
    fmt,
    marker::PhantomData,
    ops::Deref,
    sync::{Arc, OnceLock}
};

pub use self::wiring::{RefDecl, Wiring};

pub mod wiring;

/// An implementation of the interface `Self::Interface` that the runtime can construct.
///
/// The runtime allocates `Self::default()` and then, in this order, binds its
/// configuration, assigns its logger, attaches the runtime handle, wires its
/// references and calls [`Component::init`]. Which fields take part is
/// declared by the [`Wiring`] descriptor returned from [`Component::wiring`].
///
/// Usually derived with `#[derive(Component)]`, it can be implemented by hand:
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use wiring::{Component, Implements, Ref, Wiring};
///
/// trait Store: Send + Sync {}
/// trait Greeter: Send + Sync {}
///
/// #[derive(Default)]
/// struct FormalGreeter {
///     base: Implements<dyn Greeter>,
///     store: Ref<dyn Store>,
/// }
///
/// impl Greeter for FormalGreeter {}
///
/// impl Component for FormalGreeter {
///     type Interface = dyn Greeter;
///
///     fn wiring() -> Wiring<Self> {
///         Wiring::<Self>::new(|c| &mut c.base)
///             .named("formal")
///             .reference("store", |c| &mut c.store)
///     }
///
///     fn into_interface(self: Arc<Self>) -> Arc<dyn Greeter> {
///         self
///     }
/// }
/// ```
pub trait Component: Default + Send + Sync + Sized + 'static {
    /// The interface this component implements
    type Interface: ?Sized + Send + Sync + 'static;

    /// Describes how the runtime wires this component
    fn wiring() -> Wiring<Self>;

    /// Converts the constructed component into its interface
    fn into_interface(self: Arc<Self>) -> Arc<Self::Interface>;

    /// Lifecycle hook invoked once all references are wired.
    ///
    /// A failure aborts the construction; nothing is cached and a later
    /// request constructs the component again.
    #[inline]
    fn init(&self, _ctx: &CancellationToken) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Marker declaring that the enclosing struct implements the interface `I`.
///
/// Every component holds exactly one. After construction it gives access
/// back to the runtime that built the component.
pub struct Implements<I: ?Sized> {
    runtime: OnceLock<WeakRuntime>,
    _interface: PhantomData<fn() -> Box<I>>
}

impl<I: ?Sized> Default for Implements<I> {
    #[inline]
    fn default() -> Self {
        Self {
            runtime: OnceLock::new(),
            _interface: PhantomData
        }
    }
}

impl<I: ?Sized> fmt::Debug for Implements<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Implements")
            .field("interface", &type_name::<I>())
            .field("attached", &self.runtime.get().is_some())
            .finish()
    }
}

impl<I: ?Sized> Implements<I> {
    /// Returns the runtime that constructed this component,
    /// or `None` if the runtime has already been dropped
    /// or the component was not built by a runtime.
    ///
    /// Calling back into the runtime from [`Component::init`] blocks forever,
    /// because the runtime lock is held for the whole construction.
    #[inline]
    pub fn runtime(&self) -> Option<Runtime> {
        self.runtime
            .get()
            .and_then(WeakRuntime::upgrade)
    }

    #[inline]
    pub(crate) fn attach(&self, runtime: WeakRuntime) {
        // Present values may be constructed by another runtime; the first one wins.
        let _ = self.runtime.set(runtime);
    }
}

/// A reference slot naming another component by its interface `I`.
///
/// It is populated exactly once, while the owning component is being
/// constructed, and is read-only afterwards.
pub struct Ref<I: ?Sized> {
    value: OnceLock<Arc<I>>
}

impl<I: ?Sized> Default for Ref<I> {
    #[inline]
    fn default() -> Self {
        Self { value: OnceLock::new() }
    }
}

impl<I: ?Sized> fmt::Debug for Ref<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ref")
            .field("interface", &type_name::<I>())
            .field("wired", &self.value.get().is_some())
            .finish()
    }
}

impl<I: ?Sized> Ref<I> {
    /// Returns the referenced component.
    ///
    /// # Panics
    /// If called on a slot that has not been wired by a runtime.
    #[inline]
    pub fn get(&self) -> &Arc<I> {
        match self.value.get() {
            Some(value) => value,
            None => panic!("reference to {} used before it was wired", type_name::<I>())
        }
    }

    /// Returns the referenced component, or `None` if the slot is not wired
    #[inline]
    pub fn try_get(&self) -> Option<&Arc<I>> {
        self.value.get()
    }

    pub(crate) fn set(&self, value: Arc<I>) {
        if self.value.set(value).is_err() {
            panic!("reference to {} is already wired", type_name::<I>());
        }
    }
}

impl<I: ?Sized> Deref for Ref<I> {
    type Target = I;

    #[inline]
    fn deref(&self) -> &I {
        self.get()
    }
}

#[cfg(test)]
mod tests {
    use super::{Implements, Ref};
    use std::sync::Arc;

    trait Store: Send + Sync {
        fn name(&self) -> &str;
    }

    struct Memory;

    impl Store for Memory {
        fn name(&self) -> &str {
            "memory"
        }
    }

    #[test]
    fn it_wires_reference_once() {
        let slot = Ref::<dyn Store>::default();
        assert!(slot.try_get().is_none());

        slot.set(Arc::new(Memory));

        assert_eq!(slot.name(), "memory");
        assert_eq!(slot.get().name(), "memory");
    }

    #[test]
    #[should_panic(expected = "is already wired")]
    fn it_panics_on_second_wiring() {
        let slot = Ref::<dyn Store>::default();
        slot.set(Arc::new(Memory));
        slot.set(Arc::new(Memory));
    }

    #[test]
    #[should_panic(expected = "used before it was wired")]
    fn it_panics_on_unwired_access() {
        let slot = Ref::<dyn Store>::default();
        let _ = slot.get();
    }

    #[test]
    fn it_has_no_runtime_outside_of_runtime() {
        let marker = Implements::<dyn Store>::default();

        assert!(marker.runtime().is_none());
    }
}
