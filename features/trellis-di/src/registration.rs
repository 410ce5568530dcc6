use std::{
    any::{Any, TypeId},
    marker::PhantomData,
    sync::Arc,
};

use crate::{
    construct::Constructor,
    errors::BuilderError,
    interception::Interceptor,
    proxy::{ProxyBinding, Proxyable},
    types::{Injectable, Instance, TypeInfo},
};

type BoxedAny = Box<dyn Any + Send + Sync>;

/// Turns a freshly constructed concrete value into an [`Instance`] of the
/// contract, after property injection has run on it
pub(crate) type Finisher = Arc<dyn Fn(BoxedAny) -> Result<Instance, &'static str> + Send + Sync>;

/// One property to inject after construction
#[derive(Clone)]
pub(crate) struct PropertySetter {
    /// The contract resolved to fill the property
    pub(crate) property: TypeInfo,
    pub(crate) apply: Arc<dyn Fn(&mut BoxedAny, Instance) -> Result<(), &'static str> + Send + Sync>,
}

/// One concrete implementation registered under a contract
#[derive(Clone)]
pub(crate) struct ComponentData {
    pub(crate) concrete: TypeInfo,
    pub(crate) name: Option<String>,
    pub(crate) is_singleton: bool,
    pub(crate) is_default: bool,
    /// A pre-built object; when set, constructors are never consulted
    pub(crate) instance: Option<Instance>,
    pub(crate) constructors: Vec<Constructor>,
    pub(crate) properties: Vec<PropertySetter>,
    pub(crate) finish: Option<Finisher>,
}

impl ComponentData {
    fn new(concrete: TypeInfo) -> Self {
        ComponentData {
            concrete,
            name: None,
            is_singleton: false,
            is_default: false,
            instance: None,
            constructors: Vec::new(),
            properties: Vec::new(),
            finish: None,
        }
    }
}

pub(crate) type InterceptorFactory = Arc<dyn Fn() -> Arc<dyn Interceptor> + Send + Sync>;

/// One interceptor attached to a contract, identified by its type so
/// merges stay duplicate-free
#[derive(Clone)]
pub(crate) struct InterceptorEntry {
    pub(crate) kind: TypeInfo,
    pub(crate) make: InterceptorFactory,
}

/// The erased form of a registration, as stored inside the container
#[derive(Clone)]
pub(crate) struct RegistrationRecord {
    pub(crate) contract: TypeInfo,
    pub(crate) components: Vec<ComponentData>,
    pub(crate) interceptors: Vec<InterceptorEntry>,
    pub(crate) proxy: Option<ProxyBinding>,
    pub(crate) resolve_dependencies: bool,
    pub(crate) error: Option<BuilderError>,
}

impl RegistrationRecord {
    pub(crate) fn component_mut(&mut self, concrete: TypeId) -> Option<&mut ComponentData> {
        self.components
            .iter_mut()
            .find(|component| component.concrete.type_id == concrete)
    }
}

/// A fluent description of one contract and its implementations
///
/// The builder never fails mid-chain; the first problem it runs into is
/// remembered and reported when the registration reaches the container.
///
/// ```
/// use std::sync::Arc;
/// use trellis_di::{Constructor, Registration};
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
/// let registration = Registration::<dyn Clock>::for_contract()
///     .implemented_by::<FixedClock>(|clock| clock as Arc<dyn Clock>)
///     .constructor(Constructor::nullary(|| FixedClock))
///     .singleton();
/// ```
pub struct Registration<C: Injectable + ?Sized> {
    record: RegistrationRecord,
    _contract: PhantomData<fn(Arc<C>)>,
}

impl<C: Injectable + ?Sized> Registration<C> {
    pub fn for_contract() -> Self {
        Registration {
            record: RegistrationRecord {
                contract: TypeInfo::of::<C>(),
                components: Vec::new(),
                interceptors: Vec::new(),
                proxy: None,
                resolve_dependencies: false,
                error: None,
            },
            _contract: PhantomData,
        }
    }

    /// Add a concrete implementation of the contract
    ///
    /// The `unsize` function is written at the call site, where both types
    /// are statically known: `|svc| svc as Arc<dyn Contract>`. Adding the
    /// same concrete type twice is ignored.
    pub fn implemented_by<T: Injectable>(mut self, unsize: fn(Arc<T>) -> Arc<C>) -> Self {
        if self
            .record
            .component_mut(TypeId::of::<T>())
            .is_some()
        {
            tracing::debug!(
                "Component '{}' is already part of the '{}' registration, skipping",
                TypeInfo::of::<T>(),
                self.record.contract
            );
            return self;
        }
        let mut component = ComponentData::new(TypeInfo::of::<T>());
        component.finish = Some(Arc::new(move |boxed: BoxedAny| {
            let value = boxed
                .downcast::<T>()
                .map_err(|_| TypeInfo::of::<T>().type_name)?;
            Ok(Instance::new::<C>(unsize(Arc::new(*value))))
        }));
        self.record.components.push(component);
        self
    }

    /// Hand over a pre-built object as a component
    ///
    /// Resolving it always yields this very object; singleton or transient
    /// flags make no difference.
    pub fn instance<T: Injectable>(self, value: T, unsize: fn(Arc<T>) -> Arc<C>) -> Self {
        self.instance_of(TypeInfo::of::<T>(), unsize(Arc::new(value)))
    }

    /// Hand over a pre-built object already behind the contract
    pub fn instance_object(self, object: Arc<C>) -> Self {
        self.instance_of(TypeInfo::of::<C>(), object)
    }

    fn instance_of(mut self, concrete: TypeInfo, object: Arc<C>) -> Self {
        let mut component = ComponentData::new(concrete);
        component.instance = Some(Instance::new::<C>(object));
        self.record.components.push(component);
        self
    }

    /// Give the most recently added component a lookup name
    ///
    /// Without one, the component answers to its concrete type's
    /// fully-qualified name. Names are matched case-insensitively on
    /// resolve.
    pub fn named(mut self, name: &str) -> Self {
        let name = name.to_string();
        if let Some(component) = self.last_component("named") {
            component.name = Some(name);
        }
        self
    }

    /// Make the most recently added component a singleton
    pub fn singleton(mut self) -> Self {
        if let Some(component) = self.last_component("singleton") {
            component.is_singleton = true;
        }
        self
    }

    /// Mark the most recently added component as the default pick when
    /// several implementations are registered
    pub fn default_impl(mut self) -> Self {
        if let Some(component) = self.last_component("default_impl") {
            component.is_default = true;
        }
        self
    }

    /// Declare a constructor candidate for the most recently added component
    pub fn constructor(mut self, constructor: Constructor) -> Self {
        if let Some(component) = self.last_component("constructor") {
            component.constructors.push(constructor);
        }
        self
    }

    /// Declare a property of the most recently added component, filled by
    /// resolving `P` right after construction
    pub fn property<T: Injectable, P: Injectable + ?Sized>(
        mut self,
        set: fn(&mut T, Arc<P>),
    ) -> Self {
        let setter = PropertySetter {
            property: TypeInfo::of::<P>(),
            apply: Arc::new(move |boxed: &mut BoxedAny, instance: Instance| {
                let target = boxed
                    .downcast_mut::<T>()
                    .ok_or(TypeInfo::of::<T>().type_name)?;
                let value = instance.downcast::<P>()?;
                set(target, value);
                Ok(())
            }),
        };
        if let Some(component) = self.last_component("property") {
            component.properties.push(setter);
        }
        self
    }

    /// Attach an interceptor to every resolved object of this contract
    ///
    /// A fresh interceptor is built per resolved proxy. Duplicate
    /// interceptor types are ignored.
    pub fn interceptor<I: Interceptor + Default>(self) -> Self
    where
        C: Proxyable,
    {
        self.interceptor_with(|| I::default())
    }

    /// Attach an interceptor built by an explicit factory
    pub fn interceptor_with<I: Interceptor>(mut self, factory: fn() -> I) -> Self
    where
        C: Proxyable,
    {
        let kind = TypeInfo::of::<I>();
        if self
            .record
            .interceptors
            .iter()
            .any(|entry| entry.kind.type_id == kind.type_id)
        {
            tracing::debug!(
                "Interceptor '{kind}' is already attached to '{}', skipping",
                self.record.contract
            );
            return self;
        }
        self.record.interceptors.push(InterceptorEntry {
            kind,
            make: Arc::new(move || Arc::new(factory()) as Arc<dyn Interceptor>),
        });
        self.proxied()
    }

    /// Record the proxy binding for the contract without attaching any
    /// interceptor yet (mocks and module-wide interceptors need it)
    pub fn proxied(mut self) -> Self
    where
        C: Proxyable,
    {
        if self.record.proxy.is_none() {
            self.record.proxy = Some(C::proxy_binding());
        }
        self
    }

    /// Opt in to property injection: declared properties are filled from
    /// the container right after construction
    pub fn resolve_dependencies(mut self) -> Self {
        self.record.resolve_dependencies = true;
        self
    }

    fn last_component(&mut self, operation: &'static str) -> Option<&mut ComponentData> {
        if self.record.components.is_empty() {
            if self.record.error.is_none() {
                self.record.error = Some(BuilderError::NoComponent { operation });
            }
            return None;
        }
        self.record.components.last_mut()
    }

    pub(crate) fn into_record(self) -> RegistrationRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct Plain;
    impl Greeter for Plain {
        fn greet(&self) -> String {
            "hi".into()
        }
    }

    #[test]
    fn flags_apply_to_the_most_recent_component() {
        let record = Registration::<dyn Greeter>::for_contract()
            .implemented_by::<Plain>(|greeter| greeter as Arc<dyn Greeter>)
            .named("plain")
            .singleton()
            .into_record();
        assert!(record.error.is_none());
        let component = &record.components[0];
        assert_eq!(component.name.as_deref(), Some("plain"));
        assert!(component.is_singleton);
    }

    #[test]
    fn flags_without_a_component_defer_an_error() {
        let record = Registration::<dyn Greeter>::for_contract()
            .singleton()
            .into_record();
        assert!(matches!(
            record.error,
            Some(BuilderError::NoComponent { operation: "singleton" })
        ));
    }

    #[test]
    fn duplicate_concrete_types_are_ignored() {
        let record = Registration::<dyn Greeter>::for_contract()
            .implemented_by::<Plain>(|greeter| greeter as Arc<dyn Greeter>)
            .implemented_by::<Plain>(|greeter| greeter as Arc<dyn Greeter>)
            .into_record();
        assert_eq!(record.components.len(), 1);
    }

    #[test]
    fn pre_built_instances_round_trip() {
        let record = Registration::<dyn Greeter>::for_contract()
            .instance(Plain, |greeter| greeter as Arc<dyn Greeter>)
            .into_record();
        let instance = record.components[0].instance.clone().unwrap();
        let greeter = instance.downcast::<dyn Greeter>().unwrap();
        assert_eq!(greeter.greet(), "hi");
    }
}
