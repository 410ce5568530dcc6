use std::{
    any::{type_name, Any},
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use crate::{
    proxy::DispatchChain,
    types::{Injectable, TypeInfo},
};

/// A boxed argument or return value travelling through an invocation
pub type BoxedValue = Box<dyn Any + Send + Sync>;

/// The thunk performing the real call against the wrapped target,
/// consuming the current (possibly mutated) arguments
pub type TargetCall = Box<dyn FnMut(&mut Vec<BoxedValue>) -> Option<BoxedValue> + Send>;

/// A unit in the interception chain
///
/// An interceptor may read or mutate `Arguments` before calling
/// [`Invocation::proceed`], skip `proceed` entirely and supply its own
/// return value, or proceed and then post-process the return value.
pub trait Interceptor: Send + Sync + 'static {
    fn intercept(&self, invocation: &mut Invocation);
}

/// The per-call context passed through the interceptor chain
///
/// Created fresh for every intercepted call and discarded when it returns,
/// so nested and recursive interception is safe.
pub struct Invocation {
    contract: TypeInfo,
    method: &'static str,
    arguments: Vec<BoxedValue>,
    generic_arguments: Vec<TypeInfo>,
    return_type: TypeInfo,
    return_value: Option<BoxedValue>,
    argument_key: Option<u64>,
    chain: DispatchChain,
    position: usize,
    target: Option<TargetCall>,
}

impl Invocation {
    pub fn new(
        contract: TypeInfo,
        method: &'static str,
        arguments: Vec<BoxedValue>,
        argument_key: Option<u64>,
        return_type: TypeInfo,
        chain: DispatchChain,
        target: Option<TargetCall>,
    ) -> Self {
        Invocation {
            contract,
            method,
            arguments,
            generic_arguments: Vec::new(),
            return_type,
            return_value: None,
            argument_key,
            chain,
            position: 0,
            target,
        }
    }

    /// Attach the type arguments of a generic method
    ///
    /// The generated proxies cover dyn-compatible methods; hand-written
    /// proxies of type-parameterized helpers record their monomorphized
    /// type arguments here.
    pub fn with_generic_arguments(mut self, generic_arguments: Vec<TypeInfo>) -> Self {
        self.generic_arguments = generic_arguments;
        self
    }

    pub fn contract(&self) -> TypeInfo {
        self.contract
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    pub fn return_type(&self) -> TypeInfo {
        self.return_type
    }

    pub fn generic_arguments(&self) -> &[TypeInfo] {
        &self.generic_arguments
    }

    /// The precomputed hash over this call's arguments, `None` for
    /// zero-argument (property-style) members
    pub fn argument_key(&self) -> Option<u64> {
        self.argument_key
    }

    pub fn arguments(&self) -> &[BoxedValue] {
        &self.arguments
    }

    /// Read one argument, typed
    pub fn argument<T: 'static>(&self, index: usize) -> Option<&T> {
        self.arguments.get(index)?.downcast_ref::<T>()
    }

    /// Swap one argument for a new value of the same type
    ///
    /// Returns false when the index is out of range or the type differs.
    pub fn replace_argument<T: Injectable>(&mut self, index: usize, value: T) -> bool {
        match self.arguments.get_mut(index) {
            Some(slot) if slot.is::<T>() => {
                *slot = Box::new(value);
                true
            }
            _ => false,
        }
    }

    pub fn return_value<T: 'static>(&self) -> Option<&T> {
        self.return_value.as_ref()?.downcast_ref::<T>()
    }

    pub fn set_return_value<T: Injectable>(&mut self, value: T) {
        self.return_value = Some(Box::new(value));
    }

    /// Store an already-boxed return value
    pub fn put_return_value(&mut self, value: BoxedValue) {
        self.return_value = Some(value);
    }

    /// Run the next interceptor, or the real call once the chain is done
    ///
    /// A chain that never proceeds simply never reaches the target; there
    /// is no timeout guard.
    pub fn proceed(&mut self) {
        if let Some(next) = self.chain.get(self.position) {
            self.position += 1;
            tracing::trace!(
                "Interceptor {}/{} handling '{}::{}'",
                self.position,
                self.chain.len(),
                self.contract,
                self.method
            );
            next.intercept(self);
        } else if let Some(call) = self.target.as_mut() {
            self.return_value = call(&mut self.arguments);
        }
    }

    /// Drive the chain and unbox the final return value
    ///
    /// Produces the return type's default when nothing set the slot, which
    /// is how a short-circuiting interceptor or an unstubbed mock member
    /// yields its "zero value".
    pub fn finish<R: Injectable + Default>(mut self) -> R {
        self.proceed();
        match self.return_value.take() {
            Some(value) => match value.downcast::<R>() {
                Ok(value) => *value,
                Err(_) => panic!(
                    "'{}::{}' produced a return value that is not a '{}'",
                    self.contract.type_name,
                    self.method,
                    type_name::<R>()
                ),
            },
            None => R::default(),
        }
    }
}

/// Hash an argument tuple into the key used for stub lookups
///
/// The generated proxies call this over a tuple of references to the call's
/// arguments; stub declarations hash the same tuple shape, so both sides
/// agree on the key.
pub fn argument_key<A: Hash>(arguments: &A) -> u64 {
    let mut hasher = DefaultHasher::new();
    arguments.hash(&mut hasher);
    hasher.finish()
}

/// Pull the next forwarded argument back out of its box, typed
///
/// Only meant for generated target thunks; consumes arguments front to
/// back, matching declaration order.
///
/// # Panics
/// - When the argument is missing (proceed ran twice)
/// - When an interceptor replaced it with a value of a different type
pub fn take_argument<T: Injectable>(
    arguments: &mut Vec<BoxedValue>,
    method: &str,
    name: &str,
) -> T {
    if arguments.is_empty() {
        panic!("missing argument '{name}' while forwarding '{method}' - was proceed() called twice?")
    }
    match arguments.remove(0).downcast::<T>() {
        Ok(value) => *value,
        Err(_) => panic!("argument '{name}' of '{method}' was replaced with a value of a different type"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn proceed_reaches_the_target_when_the_chain_is_empty() {
        let mut invocation = Invocation::new(
            TypeInfo::of::<()>(),
            "double",
            vec![Box::new(21_u32)],
            Some(argument_key(&(&21_u32,))),
            TypeInfo::of::<u32>(),
            DispatchChain::new(Vec::new()),
            Some(Box::new(|arguments| {
                let value = take_argument::<u32>(arguments, "double", "value");
                Some(Box::new(value * 2))
            })),
        );
        invocation.proceed();
        assert_eq!(invocation.return_value::<u32>(), Some(&42));
    }

    #[test]
    fn finish_falls_back_to_the_default() {
        let invocation = Invocation::new(
            TypeInfo::of::<()>(),
            "none",
            Vec::new(),
            None,
            TypeInfo::of::<String>(),
            DispatchChain::new(Vec::new()),
            None,
        );
        assert_eq!(invocation.finish::<String>(), String::new());
    }

    #[test]
    fn short_circuiting_interceptor_supplies_the_return_value() {
        struct Fixed;
        impl Interceptor for Fixed {
            fn intercept(&self, invocation: &mut Invocation) {
                invocation.set_return_value("fixed".to_string());
            }
        }

        let invocation = Invocation::new(
            TypeInfo::of::<()>(),
            "answer",
            Vec::new(),
            None,
            TypeInfo::of::<String>(),
            DispatchChain::new(vec![Arc::new(Fixed)]),
            Some(Box::new(|_| panic!("target must not be reached"))),
        );
        assert_eq!(invocation.finish::<String>(), "fixed");
    }

    #[test]
    fn generic_arguments_are_carried_per_call() {
        let invocation = Invocation::new(
            TypeInfo::of::<()>(),
            "encode",
            Vec::new(),
            None,
            TypeInfo::of::<()>(),
            DispatchChain::new(Vec::new()),
            None,
        )
        .with_generic_arguments(vec![TypeInfo::of::<String>()]);
        assert_eq!(invocation.generic_arguments(), &[TypeInfo::of::<String>()]);
    }
}
