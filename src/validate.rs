//! Whole-graph validation of a registration set

use crate::{
    error::{DanglingRef, ValidationError},
    registry::Dep
};
use std::{any::TypeId, collections::HashSet, sync::Arc};

/// Checks that every reference declared by every registration points at an
/// interface that has at least one registration.
///
/// All dangling references are reported at once. Named references are only
/// checked for their interface; a missing name fails at resolution time.
pub fn validate_deps(deps: &[Arc<Dep>]) -> Result<(), ValidationError> {
    let registered: HashSet<TypeId> = deps
        .iter()
        .map(|dep| dep.interface().id())
        .collect();

    let violations: Vec<DanglingRef> = deps
        .iter()
        .flat_map(|dep| dep
            .references()
            .iter()
            .filter(|decl| !registered.contains(&decl.interface.id()))
            .map(|decl| DanglingRef {
                implementation: dep.implementation().name(),
                field: decl.field,
                interface: decl.interface.name()
            }))
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        tracing::debug!(count = violations.len(), "dangling references found");
        Err(ValidationError::new(violations))
    }
}

#[cfg(test)]
mod tests {
    use super::validate_deps;
    use crate::{
        component::{Component, Implements, Ref, Wiring},
        registry::{Options, Registry}
    };
    use std::sync::Arc;

    trait Store: Send + Sync {}
    trait Cache: Send + Sync {}
    trait Service: Send + Sync {}

    #[derive(Default)]
    struct Memory {
        base: Implements<dyn Store>
    }

    impl Store for Memory {}

    impl Component for Memory {
        type Interface = dyn Store;

        fn wiring() -> Wiring<Self> {
            Wiring::<Self>::new(|c| &mut c.base)
        }

        fn into_interface(self: Arc<Self>) -> Arc<dyn Store> {
            self
        }
    }

    #[derive(Default)]
    struct App {
        base: Implements<dyn Service>,
        store: Ref<dyn Store>,
        cache: Ref<dyn Cache>,
        backup: Ref<dyn Store>
    }

    impl Service for App {}

    impl Component for App {
        type Interface = dyn Service;

        fn wiring() -> Wiring<Self> {
            Wiring::<Self>::new(|c| &mut c.base)
                .reference("store", |c| &mut c.store)
                .reference("cache", |c| &mut c.cache)
                .named_reference("backup", "backup", |c| &mut c.backup)
        }

        fn into_interface(self: Arc<Self>) -> Arc<dyn Service> {
            self
        }
    }

    #[test]
    fn it_accepts_empty_graph() {
        assert!(validate_deps(&[]).is_ok());
    }

    #[test]
    fn it_reports_dangling_references() {
        let registry = Registry::new();
        registry.register::<dyn Service, App>(Options::new()).unwrap();

        let err = validate_deps(&registry.all_deps()).unwrap_err();

        let fields: Vec<_> = err.violations().iter().map(|v| v.field).collect();
        assert_eq!(fields, ["store", "cache", "backup"]);
        assert!(err.to_string().contains("maybe you forgot to register it"));
    }

    #[test]
    fn it_checks_interfaces_only() {
        let registry = Registry::new();
        registry.register::<dyn Service, App>(Options::new()).unwrap();
        registry.register::<dyn Store, Memory>(Options::new()).unwrap();

        let err = validate_deps(&registry.all_deps()).unwrap_err();

        assert_eq!(err.violations().len(), 1);
        assert_eq!(err.violations()[0].field, "cache");
        assert_eq!(err.violations()[0].interface, "dyn wiring::validate::tests::Cache");
    }
}
