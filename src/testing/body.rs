//! Test bodies taking their parameters from a runtime

/// A test function whose arguments are extracted with
/// [`FromRuntime`](super::FromRuntime)
pub trait TestBody<Args> {
    /// Calls the body with extracted arguments
    fn call(self, args: Args);
}

impl<F> TestBody<()> for F
where
    F: FnOnce()
{
    #[inline]
    fn call(self, _: ()) {
        self()
    }
}

macro_rules! define_test_body ({ $($param:ident)* } => {
    impl<F, $($param,)*> TestBody<($($param,)*)> for F
    where
        F: FnOnce($($param),*)
    {
        #[inline]
        #[allow(non_snake_case)]
        fn call(self, ($($param,)*): ($($param,)*)) {
            (self)($($param,)*)
        }
    }
});

define_test_body! { T1 }
define_test_body! { T1 T2 }
define_test_body! { T1 T2 T3 }
define_test_body! { T1 T2 T3 T4 }
define_test_body! { T1 T2 T3 T4 T5 }
