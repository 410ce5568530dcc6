use std::{
    any::{Any, TypeId},
    sync::Arc,
};

/// All errors must be Send + Sync so they can cross resolution boundaries
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// The container may be shared between threads,
/// so anything registered into it needs to be Send + Sync + 'static
pub trait Injectable: Send + Sync + 'static {}
impl<T: Send + Sync + 'static + ?Sized> Injectable for T {}

/// Type Name and Type Id
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct TypeInfo {
    pub type_name: &'static str,
    pub type_id: TypeId,
}
impl std::fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name)
    }
}
impl TypeInfo {
    pub fn of<T: 'static + ?Sized>() -> TypeInfo {
        TypeInfo {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }
}

/// A resolved instance, stored in contract shape
///
/// The payload is the `Arc<C>` of the contract it was registered under,
/// erased behind `Any` so the registry can hold instances of any contract.
#[derive(Clone)]
pub struct Instance {
    pub info: TypeInfo,
    handle: Arc<dyn Any + Send + Sync>,
}

impl Instance {
    pub fn new<C: Injectable + ?Sized>(object: Arc<C>) -> Self {
        Instance {
            info: TypeInfo::of::<C>(),
            handle: Arc::new(object),
        }
    }

    /// Recover the contract-shaped `Arc<C>` this instance was stored as
    ///
    /// On mismatch returns the type name of what is actually stored.
    pub fn downcast<C: Injectable + ?Sized>(&self) -> Result<Arc<C>, &'static str> {
        match self.handle.clone().downcast::<Arc<C>>() {
            Ok(object) => Ok((*object).clone()),
            Err(_) => Err(self.info.type_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Named: Send + Sync {
        fn name(&self) -> &'static str;
    }
    struct Fixed;
    impl Named for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    #[test]
    fn instance_round_trips_a_contract() {
        let instance = Instance::new::<dyn Named>(Arc::new(Fixed));
        let named = instance.downcast::<dyn Named>().unwrap();
        assert_eq!(named.name(), "fixed");
    }

    #[test]
    fn instance_reports_the_stored_type_on_mismatch() {
        let instance = Instance::new::<String>(Arc::new("hello".to_string()));
        let err = instance
            .downcast::<dyn Named>()
            .err()
            .expect("the stored type differs");
        assert!(err.contains("String"));
    }
}
