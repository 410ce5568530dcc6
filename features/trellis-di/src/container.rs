use std::{
    any::{Any, TypeId},
    collections::{HashMap, HashSet},
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
};

use crate::{
    construct::{Arguments, ParamSpec},
    errors::{BuilderError, ProxyError, ResolveError},
    module::ModuleInfo,
    proxy::DispatchChain,
    registration::{ComponentData, Registration, RegistrationRecord},
    types::{Injectable, Instance, TypeInfo},
};

type BoxedAny = Box<dyn Any + Send + Sync>;

/// Identifies one component: (contract, concrete)
type ComponentKey = (TypeId, TypeId);

#[derive(Default)]
struct ContainerState {
    registrations: HashMap<TypeId, RegistrationRecord>,
    singletons: HashMap<ComponentKey, Instance>,
    /// Singletons some thread is constructing right now
    building: HashSet<ComponentKey>,
}

/// The composition root: registrations go in, resolved objects come out
///
/// The container is an explicit value; share it behind an `Arc` to use it
/// from several places. All operations take `&self` and are thread-safe.
/// The inner lock is released while constructors run, so components may
/// resolve their own dependencies recursively, and a singleton is built
/// exactly once however many threads ask for it at the same time.
#[derive(Default)]
pub struct DiContainer {
    state: Mutex<ContainerState>,
    build_cv: Condvar,
}

impl DiContainer {
    pub fn new() -> Self {
        DiContainer::default()
    }

    fn lock(&self) -> MutexGuard<'_, ContainerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install one registration
    ///
    /// Registering a contract twice merges: components and interceptors not
    /// seen before are added, everything else keeps its first-registered
    /// shape.
    pub fn register<C: Injectable + ?Sized>(
        &self,
        registration: Registration<C>,
    ) -> Result<(), BuilderError> {
        self.install(registration.into_record())
    }

    /// Install a whole module
    pub fn register_module(&self, module: ModuleInfo) -> Result<(), BuilderError> {
        let (records, error) = module.into_parts();
        if let Some(error) = error {
            return Err(error);
        }
        for record in records {
            self.install(record)?;
        }
        Ok(())
    }

    fn install(&self, record: RegistrationRecord) -> Result<(), BuilderError> {
        if let Some(error) = record.error {
            return Err(error);
        }
        tracing::debug!(
            "Registering '{}' with {} component(s) and {} interceptor(s)",
            record.contract,
            record.components.len(),
            record.interceptors.len()
        );
        let mut state = self.lock();
        match state.registrations.get_mut(&record.contract.type_id) {
            Some(existing) => {
                for component in record.components {
                    if existing.component_mut(component.concrete.type_id).is_some() {
                        tracing::debug!(
                            "Component '{}' already registered for '{}', keeping the first",
                            component.concrete,
                            existing.contract
                        );
                        continue;
                    }
                    existing.components.push(component);
                }
                for entry in record.interceptors {
                    if existing
                        .interceptors
                        .iter()
                        .any(|known| known.kind.type_id == entry.kind.type_id)
                    {
                        continue;
                    }
                    existing.interceptors.push(entry);
                }
                if existing.proxy.is_none() {
                    existing.proxy = record.proxy;
                }
                existing.resolve_dependencies |= record.resolve_dependencies;
            }
            None => {
                state.registrations.insert(record.contract.type_id, record);
            }
        }
        Ok(())
    }

    /// Resolve a contract to its selected implementation
    pub fn resolve<C: Injectable + ?Sized>(&self) -> Result<Arc<C>, ResolveError> {
        self.resolve_with(Arguments::new())
    }

    /// Resolve a contract, supplying constructor arguments
    pub fn resolve_with<C: Injectable + ?Sized>(
        &self,
        arguments: Arguments,
    ) -> Result<Arc<C>, ResolveError> {
        let instance = self.resolve_instance(TypeInfo::of::<C>(), None, arguments)?;
        downcast_resolved(instance)
    }

    /// Resolve the component registered under the given name
    pub fn resolve_named<C: Injectable + ?Sized>(&self, name: &str) -> Result<Arc<C>, ResolveError> {
        self.resolve_named_with(name, Arguments::new())
    }

    /// Resolve by name, supplying constructor arguments
    pub fn resolve_named_with<C: Injectable + ?Sized>(
        &self,
        name: &str,
        arguments: Arguments,
    ) -> Result<Arc<C>, ResolveError> {
        let instance = self.resolve_instance(TypeInfo::of::<C>(), Some(name), arguments)?;
        downcast_resolved(instance)
    }

    /// Drop every registration and cached singleton
    pub fn reset(&self) {
        tracing::debug!("Resetting the container");
        let mut state = self.lock();
        state.registrations.clear();
        state.singletons.clear();
        state.building.clear();
        self.build_cv.notify_all();
    }

    /// The type-erased resolve every public variant funnels into
    fn resolve_instance(
        &self,
        contract: TypeInfo,
        name: Option<&str>,
        arguments: Arguments,
    ) -> Result<Instance, ResolveError> {
        tracing::trace!("Resolving '{contract}'");
        let mut state = self.lock();
        let (component, interceptors, proxy, resolve_dependencies, reserved) = loop {
            let record = state
                .registrations
                .get(&contract.type_id)
                .ok_or(ResolveError::NotRegistered(contract.type_name))?;
            let component = select_component(record, contract, name)?;
            let key = (contract.type_id, component.concrete.type_id);

            if component.is_singleton {
                if let Some(existing) = state.singletons.get(&key) {
                    tracing::trace!("Serving cached singleton '{}'", component.concrete);
                    return Ok(existing.clone());
                }
                if state.building.contains(&key) {
                    // another thread is constructing it, wait and re-check
                    state = self
                        .build_cv
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                    continue;
                }
            }

            let component = component.clone();
            let interceptors = record.interceptors.clone();
            let proxy = record.proxy.clone();
            let resolve_dependencies = record.resolve_dependencies;
            let reserved = component.is_singleton;
            if reserved {
                state.building.insert(key);
            }
            break (component, interceptors, proxy, resolve_dependencies, reserved);
        };
        drop(state);

        let key = (contract.type_id, component.concrete.type_id);
        let result = (|| {
            let instance = match component.instance.clone() {
                Some(instance) => instance,
                None => self.construct(contract, &component, arguments, resolve_dependencies)?,
            };
            if interceptors.is_empty() {
                return Ok(instance);
            }
            let binding = proxy
                .ok_or(ProxyError::NotProxyable(contract.type_name))
                .map_err(ResolveError::Proxy)?;
            let chain = DispatchChain::new(interceptors.iter().map(|entry| (entry.make)()).collect());
            Ok(binding.synthesize(Some(instance), chain)?)
        })();

        if !reserved {
            return result;
        }
        let mut state = self.lock();
        state.building.remove(&key);
        self.build_cv.notify_all();
        match result {
            Ok(instance) => {
                let stored = state.singletons.entry(key).or_insert(instance);
                Ok(stored.clone())
            }
            Err(error) => Err(error),
        }
    }

    /// Pick a constructor, gather its arguments and run it
    fn construct(
        &self,
        contract: TypeInfo,
        component: &ComponentData,
        arguments: Arguments,
        resolve_dependencies: bool,
    ) -> Result<Instance, ResolveError> {
        let concrete = component.concrete;
        let mut supplied: Vec<Option<_>> = arguments.into_vec().into_iter().map(Some).collect();

        // with no arguments a zero-parameter constructor is tried first
        let mut candidates: Vec<_> = component.constructors.iter().collect();
        if supplied.is_empty() {
            candidates.sort_by_key(|ctor| !ctor.params().is_empty());
        }

        'candidate: for constructor in candidates {
            let params = constructor.params();
            let mut used = vec![false; supplied.len()];
            let mut plan: Vec<(usize, PlannedSource)> = Vec::with_capacity(params.len());
            for (position, param) in params.iter().enumerate() {
                if let Some(index) = find_match(&supplied, &used, param) {
                    used[index] = true;
                    plan.push((position, PlannedSource::Supplied(index)));
                    continue;
                }
                // recursion only steps in on argument-free resolves
                match param.resolve_target() {
                    Some(target) if supplied.is_empty() => {
                        plan.push((position, PlannedSource::Resolve(target)))
                    }
                    _ => continue 'candidate,
                }
            }
            // every supplied argument must find a parameter
            if used.iter().any(|consumed| !consumed) {
                continue 'candidate;
            }

            // resolve dependencies before consuming any supplied argument,
            // so a failed candidate leaves the pool intact for the next one
            let mut values: Vec<Option<BoxedAny>> = params.iter().map(|_| None).collect();
            for (position, source) in &plan {
                let PlannedSource::Resolve(target) = source else {
                    continue;
                };
                let dependency = match self.resolve_instance(*target, None, Arguments::new()) {
                    Ok(dependency) => dependency,
                    Err(error) => {
                        tracing::debug!(
                            "Constructor of '{concrete}' rejected, dependency '{target}' failed: {error}"
                        );
                        continue 'candidate;
                    }
                };
                let param = &params[*position];
                match convert_dependency(param, dependency) {
                    Some(value) => values[*position] = Some(value),
                    None => {
                        tracing::debug!(
                            "Constructor of '{concrete}' rejected, dependency '{target}' had the wrong shape"
                        );
                        continue 'candidate;
                    }
                }
            }
            for (position, source) in &plan {
                let PlannedSource::Supplied(index) = source else {
                    continue;
                };
                let argument = supplied[*index]
                    .take()
                    .ok_or(ResolveError::NoMatchingConstructor {
                        concrete: concrete.type_name,
                    })?;
                values[*position] = Some(params[*position].convert(argument));
            }
            let values: Vec<BoxedAny> = values
                .into_iter()
                .map(|value| {
                    value.ok_or(ResolveError::NoMatchingConstructor {
                        concrete: concrete.type_name,
                    })
                })
                .collect::<Result<_, _>>()?;

            tracing::debug!(
                "Constructing '{concrete}' with {} parameter(s)",
                params.len()
            );
            let mut built = constructor
                .build(crate::construct::ResolvedArgs::new(values))
                .map_err(|error| ResolveError::ConstructorFailed {
                    concrete: concrete.type_name,
                    error: Arc::new(error),
                })?;

            if resolve_dependencies {
                self.inject_properties(component, &mut built);
            }

            let finish = component
                .finish
                .as_ref()
                .ok_or(ResolveError::NoMatchingConstructor {
                    concrete: concrete.type_name,
                })?;
            return finish(built).map_err(|required| ResolveError::DowncastFailed {
                required_type: required,
                actual_type: concrete.type_name,
            });
        }

        tracing::debug!("No constructor of '{concrete}' matched for '{contract}'");
        Err(ResolveError::NoMatchingConstructor {
            concrete: concrete.type_name,
        })
    }

    /// Best effort: a property whose contract cannot be resolved is left
    /// at its constructed value
    fn inject_properties(&self, component: &ComponentData, built: &mut BoxedAny) {
        for setter in &component.properties {
            let value = match self.resolve_instance(setter.property, None, Arguments::new()) {
                Ok(value) => value,
                Err(error) => {
                    tracing::debug!(
                        "Property '{}' of '{}' not injected: {error}",
                        setter.property,
                        component.concrete
                    );
                    continue;
                }
            };
            if let Err(required) = (setter.apply)(built, value) {
                tracing::warn!(
                    "Property '{}' of '{}' not injected, value was not a '{required}'",
                    setter.property,
                    component.concrete
                );
            }
        }
    }
}

enum PlannedSource {
    Supplied(usize),
    Resolve(TypeInfo),
}

fn find_match(
    supplied: &[Option<crate::construct::Argument>],
    used: &[bool],
    param: &ParamSpec,
) -> Option<usize> {
    supplied.iter().enumerate().position(|(index, slot)| {
        !used[index]
            && slot
                .as_ref()
                .is_some_and(|argument| param.matches(argument))
    })
}

fn convert_dependency(param: &ParamSpec, dependency: Instance) -> Option<BoxedAny> {
    let converter = param.instance_converter()?;
    converter(dependency).ok()
}

fn downcast_resolved<C: Injectable + ?Sized>(instance: Instance) -> Result<Arc<C>, ResolveError> {
    instance
        .downcast::<C>()
        .map_err(|actual| ResolveError::DowncastFailed {
            required_type: TypeInfo::of::<C>().type_name,
            actual_type: actual,
        })
}

fn select_component<'r>(
    record: &'r RegistrationRecord,
    contract: TypeInfo,
    name: Option<&str>,
) -> Result<&'r ComponentData, ResolveError> {
    if record.components.is_empty() {
        return Err(ResolveError::NoImplementation(contract.type_name));
    }
    match name {
        Some(name) => record
            .components
            .iter()
            .find(|component| {
                // an unnamed component answers to its concrete type's name
                component
                    .name
                    .as_deref()
                    .unwrap_or(component.concrete.type_name)
                    .eq_ignore_ascii_case(name)
            })
            .ok_or_else(|| ResolveError::NameNotFound {
                contract: contract.type_name,
                name: name.to_string(),
            }),
        None => Ok(record
            .components
            .iter()
            .find(|component| component.is_default)
            .unwrap_or(&record.components[0])),
    }
}
