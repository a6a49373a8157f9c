//! Type-erased component instances held by the runtime

use crate::component::Component;
use std::{
    any::{type_name, Any},
    fmt,
    sync::Arc
};

type ArcAny = Arc<
    dyn Any
    + Send
    + Sync
>;

/// A resolved component: the shared implementation (absent for fakes and
/// interface-only values) and its interface view.
///
/// Cloning is cheap; clones share the same underlying objects.
#[derive(Clone)]
pub struct Instance {
    implementation: Option<ArcAny>,
    /// Holds an `Arc<I>` of the component's interface `I`
    interface: ArcAny,
    type_name: &'static str
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.type_name)
            .field("implementation", &self.implementation.is_some())
            .finish()
    }
}

impl Instance {
    /// Wraps a ready-made component, e.g. a value supplied to the runtime up front
    #[inline]
    pub fn of<X: Component>(component: X) -> Self {
        Self::from_arc(Arc::new(component))
    }

    /// Wraps a shared component
    #[inline]
    pub fn from_arc<X: Component>(component: Arc<X>) -> Self {
        let interface = X::into_interface(component.clone());
        Self {
            implementation: Some(component),
            interface: Arc::new(interface),
            type_name: type_name::<X>()
        }
    }

    /// Wraps a value known only through its interface `I`, e.g. a fake
    #[inline]
    pub fn from_interface<I>(value: Arc<I>) -> Self
    where
        I: ?Sized + Send + Sync + 'static
    {
        Self {
            implementation: None,
            interface: Arc::new(value),
            type_name: type_name::<I>()
        }
    }

    /// Returns the interface view as `Arc<I>`, or `None` if the instance implements another interface
    #[inline]
    pub fn downcast_interface<I>(&self) -> Option<Arc<I>>
    where
        I: ?Sized + Send + Sync + 'static
    {
        self.interface
            .downcast_ref::<Arc<I>>()
            .cloned()
    }

    /// Returns the implementation as `Arc<X>`, or `None` if it is of another type or unknown
    #[inline]
    pub fn downcast_implementation<X>(&self) -> Option<Arc<X>>
    where
        X: Send + Sync + 'static
    {
        self.implementation
            .clone()?
            .downcast::<X>()
            .ok()
    }

    /// Name of the type the instance was created from
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Checks whether both instances share the same interface object
    #[inline]
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.interface, &other.interface)
    }
}
