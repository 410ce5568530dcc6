//! Mocks built on the interception layer
//!
//! A mock is a proxy with no target: every call runs through a single
//! interceptor that serves stubbed return values, and members without a
//! stub yield their return type's default. Any contract declared with
//! `trellis_di::proxy_contract!` can be mocked.
//!
//! ```
//! use trellis_di::proxy_contract;
//! use trellis_mock::Mock;
//!
//! proxy_contract! {
//!     pub trait Pricer => PricerProxy {
//!         fn price(&self, article: String) -> u32;
//!     }
//! }
//!
//! let mock = Mock::<dyn Pricer>::new().unwrap();
//! mock.stub_call("price", &("apple".to_string(),)).returns(3_u32);
//!
//! let pricer = mock.object();
//! assert_eq!(pricer.price("apple".into()), 3);
//! assert_eq!(pricer.price("pear".into()), 0);
//! ```

mod interceptor;
mod repository;

use std::{hash::Hash, sync::Arc};

use thiserror::Error;
use trellis_di::{
    argument_key, BoxedValue, BuilderError, DiContainer, DispatchChain, Injectable, ProxyError,
    Proxyable, Registration, TypeInfo,
};

use crate::{
    interceptor::MockInterceptor,
    repository::{MemberKey, StubRepository},
};

/// Errors while wiring up a mock
#[derive(Error, Debug, Clone)]
pub enum MockError {
    #[error(transparent)]
    Proxy(#[from] ProxyError),
    /// The proxy binding of the contract produced something else
    #[error("The synthesized mock was not a '{required}'")]
    WrongShape { required: &'static str },
}

/// A stub-backed stand-in for one contract
///
/// Each mock owns its own stub table; two mocks of the same contract never
/// see each other's stubs.
pub struct Mock<C: Proxyable + ?Sized> {
    object: Arc<C>,
    stubs: Arc<StubRepository>,
}

impl<C: Proxyable + ?Sized> Mock<C> {
    pub fn new() -> Result<Self, MockError> {
        let stubs = Arc::new(StubRepository::default());
        let chain = DispatchChain::single(Arc::new(MockInterceptor::new(stubs.clone())));
        let instance = C::proxy_binding().synthesize(None, chain)?;
        let object = instance.downcast::<C>().map_err(|_| MockError::WrongShape {
            required: TypeInfo::of::<C>().type_name,
        })?;
        Ok(Mock { object, stubs })
    }

    /// The mocked object, ready to hand to code under test
    pub fn object(&self) -> Arc<C> {
        self.object.clone()
    }

    /// Stub a member for any arguments
    ///
    /// Zero-argument members are always stubbed this way. Stubbing the
    /// same member again replaces the earlier stub.
    pub fn stub(&self, member: &'static str) -> StubBuilder<'_> {
        StubBuilder {
            stubs: &self.stubs,
            key: MemberKey {
                member,
                arguments: None,
            },
        }
    }

    /// Stub a member for one specific argument tuple
    ///
    /// Pass the arguments as a tuple matching the member's signature,
    /// e.g. `&("apple".to_string(),)` for a single-argument member. A
    /// call with other arguments falls back to the member-wide stub, or
    /// the default when none exists.
    pub fn stub_call<A: Hash>(&self, member: &'static str, arguments: &A) -> StubBuilder<'_> {
        StubBuilder {
            stubs: &self.stubs,
            key: MemberKey {
                member,
                arguments: Some(argument_key(arguments)),
            },
        }
    }

    /// Register the mocked object in a container, so code resolving the
    /// contract gets the mock
    pub fn register_in(&self, container: &DiContainer) -> Result<(), BuilderError> {
        container.register(Registration::<C>::for_contract().instance_object(self.object()))
    }
}

/// Second half of a stub declaration; finished by [`StubBuilder::returns`]
pub struct StubBuilder<'mock> {
    stubs: &'mock StubRepository,
    key: MemberKey,
}

impl StubBuilder<'_> {
    /// Let the stubbed member return a clone of this value
    pub fn returns<T: Injectable + Clone>(self, value: T) {
        self.stubs
            .bind(self.key, Arc::new(move || Box::new(value.clone()) as BoxedValue));
    }

    /// Let the stubbed member compute its return value per call
    pub fn returns_with<T: Injectable>(self, produce: impl Fn() -> T + Send + Sync + 'static) {
        self.stubs
            .bind(self.key, Arc::new(move || Box::new(produce()) as BoxedValue));
    }
}

/// Shorthand for [`Mock::new`]
pub fn create_mock<C: Proxyable + ?Sized>() -> Result<Mock<C>, MockError> {
    Mock::new()
}
