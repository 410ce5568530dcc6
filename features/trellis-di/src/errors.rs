use std::sync::Arc;

use thiserror::Error;

use crate::types::DynError;

/// Errors raised while a registration or module was being described
///
/// The fluent builders stay infallible; the first error they run into is
/// recorded and surfaced when the unit is handed to the container.
#[derive(Error, Debug, Clone)]
pub enum BuilderError {
    /// A flag or constructor was declared before any component existed
    #[error("'{operation}' requires a component to be added first")]
    NoComponent { operation: &'static str },
    /// A module-wide operation named a concrete type no registration contains
    #[error("No component with concrete type '{concrete}' exists in this module")]
    UnknownComponent { concrete: &'static str },
}

/// Errors when trying to resolve a contract
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    /// No registration exists for the contract
    #[error("The contract '{0}' is not registered.")]
    NotRegistered(&'static str),
    /// A registration exists but holds no components
    #[error("The contract '{0}' has no implementations registered.")]
    NoImplementation(&'static str),
    /// A named lookup matched no component
    #[error("No component named '{name}' is registered for '{contract}'")]
    NameNotFound {
        contract: &'static str,
        name: String,
    },
    /// No constructor could be satisfied by the supplied arguments
    /// or by recursive resolution
    #[error("No constructor of '{concrete}' could be matched")]
    NoMatchingConstructor { concrete: &'static str },
    /// A constructor closure failed
    #[error("Constructor for '{concrete}' failed - error: {error:?}")]
    ConstructorFailed {
        concrete: &'static str,
        error: Arc<DynError>,
    },
    /// Proxy wrapping failed
    #[error(transparent)]
    Proxy(#[from] ProxyError),

    #[error("Failed to downcast, required: '{required_type}' actual: '{actual_type}'")]
    DowncastFailed {
        required_type: &'static str,
        actual_type: &'static str,
    },
}

/// Errors while wrapping an instance in a proxy
#[derive(Error, Debug, Clone)]
pub enum ProxyError {
    /// The contract carries interceptors but no proxy binding
    #[error("The contract '{0}' exposes nothing to proxy")]
    NotProxyable(&'static str),
    /// The target handed to a binding was not of its contract
    #[error("Proxy target mismatch, required: '{required}' actual: '{actual}'")]
    TargetMismatch {
        required: &'static str,
        actual: &'static str,
    },
}
