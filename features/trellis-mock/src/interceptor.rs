use std::sync::Arc;

use trellis_di::{Interceptor, Invocation};

use crate::repository::StubRepository;

/// Serves stubbed return values instead of forwarding anywhere
///
/// The mock proxy has no target, so a member without a stub simply leaves
/// the return slot empty and the call yields the return type's default.
pub(crate) struct MockInterceptor {
    stubs: Arc<StubRepository>,
}

impl MockInterceptor {
    pub(crate) fn new(stubs: Arc<StubRepository>) -> Self {
        MockInterceptor { stubs }
    }
}

impl Interceptor for MockInterceptor {
    fn intercept(&self, invocation: &mut Invocation) {
        match self
            .stubs
            .lookup(invocation.method(), invocation.argument_key())
        {
            Some(value) => invocation.put_return_value(value),
            None => tracing::trace!(
                "No stub for '{}::{}', serving the default",
                invocation.contract(),
                invocation.method()
            ),
        }
    }
}
