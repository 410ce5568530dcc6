use std::{any::TypeId, sync::Arc};

use crate::{
    errors::BuilderError,
    interception::Interceptor,
    registration::{InterceptorEntry, Registration, RegistrationRecord},
    types::{Injectable, TypeInfo},
};

/// A bundle of registrations installed into a container in one step
///
/// Modules let a feature describe all of its contracts in one place and
/// apply cross-cutting tweaks over the whole bundle. Like the registration
/// builder it never fails mid-chain; problems surface when the module is
/// handed to the container.
///
/// ```
/// use std::sync::Arc;
/// use trellis_di::{Constructor, ModuleInfo, Registration};
///
/// trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
/// struct FixedClock;
/// impl Clock for FixedClock {
///     fn now(&self) -> u64 {
///         0
///     }
/// }
///
/// let module = ModuleInfo::new().register(
///     Registration::<dyn Clock>::for_contract()
///         .implemented_by::<FixedClock>(|clock| clock as Arc<dyn Clock>)
///         .constructor(Constructor::nullary(|| FixedClock)),
/// );
/// ```
#[derive(Default)]
pub struct ModuleInfo {
    records: Vec<RegistrationRecord>,
    error: Option<BuilderError>,
}

impl ModuleInfo {
    pub fn new() -> Self {
        ModuleInfo::default()
    }

    /// Add one registration to the bundle
    pub fn register<C: Injectable + ?Sized>(mut self, registration: Registration<C>) -> Self {
        self.records.push(registration.into_record());
        self
    }

    /// Attach an interceptor to every proxyable registration in the bundle
    ///
    /// Registrations without a proxy binding are left alone; duplicate
    /// interceptor types per registration are ignored.
    pub fn interceptor_for_all<I: Interceptor + Default>(mut self) -> Self {
        let kind = TypeInfo::of::<I>();
        for record in &mut self.records {
            if record.proxy.is_none() {
                tracing::debug!(
                    "Contract '{}' exposes nothing to proxy, module-wide interceptor '{kind}' not attached",
                    record.contract
                );
                continue;
            }
            if record
                .interceptors
                .iter()
                .any(|entry| entry.kind.type_id == kind.type_id)
            {
                continue;
            }
            record.interceptors.push(InterceptorEntry {
                kind,
                make: Arc::new(|| Arc::new(I::default()) as Arc<dyn Interceptor>),
            });
        }
        self
    }

    /// Flip one component of the bundle to singleton, wherever it was
    /// registered
    pub fn singleton_of<T: Injectable>(mut self) -> Self {
        let concrete = TypeId::of::<T>();
        let component = self
            .records
            .iter_mut()
            .find_map(|record| record.component_mut(concrete));
        match component {
            Some(component) => component.is_singleton = true,
            None if self.error.is_none() => {
                self.error = Some(BuilderError::UnknownComponent {
                    concrete: TypeInfo::of::<T>().type_name,
                });
            }
            None => {}
        }
        self
    }

    pub(crate) fn into_parts(self) -> (Vec<RegistrationRecord>, Option<BuilderError>) {
        (self.records, self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interception::Invocation;

    trait Port: Send + Sync {
        fn label(&self) -> String;
    }
    struct Serial;
    impl Port for Serial {
        fn label(&self) -> String {
            "serial".into()
        }
    }

    #[derive(Default)]
    struct Noop;
    impl Interceptor for Noop {
        fn intercept(&self, invocation: &mut Invocation) {
            invocation.proceed();
        }
    }

    #[test]
    fn singleton_of_finds_the_component_across_registrations() {
        let (records, error) = ModuleInfo::new()
            .register(
                Registration::<dyn Port>::for_contract()
                    .implemented_by::<Serial>(|port| port as Arc<dyn Port>),
            )
            .singleton_of::<Serial>()
            .into_parts();
        assert!(error.is_none());
        assert!(records[0].components[0].is_singleton);
    }

    #[test]
    fn singleton_of_an_unknown_component_defers_an_error() {
        let (_, error) = ModuleInfo::new().singleton_of::<Serial>().into_parts();
        assert!(matches!(error, Some(BuilderError::UnknownComponent { .. })));
    }

    #[test]
    fn module_wide_interceptors_skip_unproxyable_contracts() {
        let (records, _) = ModuleInfo::new()
            .register(
                Registration::<dyn Port>::for_contract()
                    .implemented_by::<Serial>(|port| port as Arc<dyn Port>),
            )
            .interceptor_for_all::<Noop>()
            .into_parts();
        assert!(records[0].interceptors.is_empty());
    }
}
