//! Extractors for fetching test parameters from a runtime

use crate::{
    component::Component,
    error::Error,
    runtime::Runtime
};
use tokio_util::sync::CancellationToken;
use std::{fmt, ops::Deref, sync::Arc};

/// A trait that defines how to extract `Self` from a runtime
pub trait FromRuntime: Sized {
    /// Extracts `Self` from the runtime
    fn from_runtime(runtime: &Runtime) -> Result<Self, Error>;
}

/// The anonymous dependency of the interface `I`
pub struct Intf<I: ?Sized>(pub Arc<I>);

/// The instance of the implementation `X`
pub struct Impl<X>(pub Arc<X>);

impl<I: ?Sized> Intf<I> {
    /// Unwraps the inner [`Arc`]
    #[inline]
    pub fn into_inner(self) -> Arc<I> {
        self.0
    }
}

impl<X> Impl<X> {
    /// Unwraps the inner [`Arc`]
    #[inline]
    pub fn into_inner(self) -> Arc<X> {
        self.0
    }
}

impl<I: ?Sized> Deref for Intf<I> {
    type Target = I;

    #[inline]
    fn deref(&self) -> &I {
        &self.0
    }
}

impl<X> Deref for Impl<X> {
    type Target = X;

    #[inline]
    fn deref(&self) -> &X {
        &self.0
    }
}

impl<I: ?Sized> fmt::Debug for Intf<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Intf")
            .field(&std::any::type_name::<I>())
            .finish()
    }
}

impl<X> fmt::Debug for Impl<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Impl")
            .field(&std::any::type_name::<X>())
            .finish()
    }
}

impl FromRuntime for Runtime {
    #[inline]
    fn from_runtime(runtime: &Runtime) -> Result<Self, Error> {
        Ok(runtime.clone())
    }
}

impl FromRuntime for CancellationToken {
    #[inline]
    fn from_runtime(runtime: &Runtime) -> Result<Self, Error> {
        Ok(runtime.context().clone())
    }
}

impl FromRuntime for () {
    #[inline]
    fn from_runtime(_: &Runtime) -> Result<Self, Error> {
        Ok(())
    }
}

impl<I> FromRuntime for Intf<I>
where
    I: ?Sized + Send + Sync + 'static
{
    #[inline]
    fn from_runtime(runtime: &Runtime) -> Result<Self, Error> {
        runtime
            .get_intf::<I>("")
            .map(Intf)
    }
}

impl<X: Component> FromRuntime for Impl<X> {
    #[inline]
    fn from_runtime(runtime: &Runtime) -> Result<Self, Error> {
        runtime
            .get_impl::<X>()
            .map(Impl)
    }
}

macro_rules! define_generic_from_runtime {
    ($($T: ident),*) => {
        impl<$($T: FromRuntime),+> FromRuntime for ($($T,)+) {
            #[inline]
            #[allow(non_snake_case)]
            fn from_runtime(runtime: &Runtime) -> Result<Self, Error> {
                let tuple = (
                    $(
                    $T::from_runtime(runtime)?,
                    )*
                );
                Ok(tuple)
            }
        }
    }
}

define_generic_from_runtime! { T1 }
define_generic_from_runtime! { T1, T2 }
define_generic_from_runtime! { T1, T2, T3 }
define_generic_from_runtime! { T1, T2, T3, T4 }
define_generic_from_runtime! { T1, T2, T3, T4, T5 }
