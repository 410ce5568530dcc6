//! An inversion-of-control container with interception
//!
//! Contracts are `dyn Trait` objects. A [`Registration`] describes which
//! concrete types implement a contract, how to construct them and which
//! interceptors wrap them; the [`DiContainer`] resolves contracts to
//! shared objects, caching singletons and synthesizing forwarding proxies
//! where interceptors are attached.
//!
//! ```
//! use std::sync::Arc;
//! use trellis_di::{Constructor, DiContainer, Registration};
//!
//! trait Clock: Send + Sync {
//!     fn now(&self) -> u64;
//! }
//! struct FixedClock;
//! impl Clock for FixedClock {
//!     fn now(&self) -> u64 {
//!         42
//!     }
//! }
//!
//! let container = DiContainer::new();
//! container
//!     .register(
//!         Registration::<dyn Clock>::for_contract()
//!             .implemented_by::<FixedClock>(|clock| clock as Arc<dyn Clock>)
//!             .constructor(Constructor::nullary(|| FixedClock)),
//!     )
//!     .unwrap();
//!
//! let clock = container.resolve::<dyn Clock>().unwrap();
//! assert_eq!(clock.now(), 42);
//! ```

mod construct;
mod container;
mod errors;
mod interception;
mod macros;
mod module;
mod proxy;
mod registration;
mod types;

pub use construct::{Argument, Arguments, Constructor, ParamSpec, ResolvedArgs};
pub use container::DiContainer;
pub use errors::{BuilderError, ProxyError, ResolveError};
pub use interception::{
    argument_key, take_argument, BoxedValue, Interceptor, Invocation, TargetCall,
};
pub use module::ModuleInfo;
pub use proxy::{DispatchChain, ProxyBinding, Proxyable};
pub use registration::Registration;
pub use types::{DynError, Injectable, Instance, TypeInfo};
