use std::sync::Arc;

use crate::{
    errors::ProxyError,
    interception::Interceptor,
    types::{Injectable, Instance, TypeInfo},
};

/// The ordered interceptor chain shared by every call on one proxy
#[derive(Clone)]
pub struct DispatchChain {
    interceptors: Arc<[Arc<dyn Interceptor>]>,
}

impl DispatchChain {
    pub fn new(interceptors: Vec<Arc<dyn Interceptor>>) -> Self {
        DispatchChain {
            interceptors: interceptors.into(),
        }
    }

    pub fn single(interceptor: Arc<dyn Interceptor>) -> Self {
        DispatchChain::new(vec![interceptor])
    }

    pub fn get(&self, position: usize) -> Option<Arc<dyn Interceptor>> {
        self.interceptors.get(position).cloned()
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}

/// A contract with a generated forwarding proxy
///
/// Implemented for the `dyn Trait` type by [`crate::proxy_contract!`].
pub trait Proxyable: Injectable {
    fn proxy_binding() -> ProxyBinding;
}

type MakeProxy = Arc<dyn Fn(Option<Instance>, DispatchChain) -> Result<Instance, ProxyError> + Send + Sync>;

/// Builds proxy instances for one contract
///
/// The forwarding type is compiled per contract; the binding is the erased
/// handle the container memoizes, one per contract, so "synthesis" happens
/// at most once however many objects get wrapped.
#[derive(Clone)]
pub struct ProxyBinding {
    contract: TypeInfo,
    make: MakeProxy,
}

impl ProxyBinding {
    pub fn new<C: Injectable + ?Sized>(make: fn(Option<Arc<C>>, DispatchChain) -> Arc<C>) -> Self {
        ProxyBinding {
            contract: TypeInfo::of::<C>(),
            make: Arc::new(move |target, chain| {
                let target = match target {
                    Some(instance) => {
                        Some(instance.downcast::<C>().map_err(|actual| {
                            ProxyError::TargetMismatch {
                                required: TypeInfo::of::<C>().type_name,
                                actual,
                            }
                        })?)
                    }
                    None => None,
                };
                Ok(Instance::new::<C>(make(target, chain)))
            }),
        }
    }

    pub fn contract(&self) -> TypeInfo {
        self.contract
    }

    /// Wrap a target (or no target, for mocks) in a new proxy
    pub fn synthesize(
        &self,
        target: Option<Instance>,
        chain: DispatchChain,
    ) -> Result<Instance, ProxyError> {
        tracing::debug!(
            "Synthesizing proxy for '{}' with {} interceptor(s)",
            self.contract,
            chain.len()
        );
        (self.make)(target, chain)
    }
}
