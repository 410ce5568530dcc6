use trellis_di::{Interceptor, Invocation};

/// Logs every intercepted call before and after it runs
#[derive(Default)]
pub struct AuditInterceptor;

impl Interceptor for AuditInterceptor {
    fn intercept(&self, invocation: &mut Invocation) {
        tracing::info!(
            "-> {}::{} ({} argument(s))",
            invocation.contract(),
            invocation.method(),
            invocation.arguments().len()
        );
        invocation.proceed();
        tracing::info!("<- {}::{}", invocation.contract(), invocation.method());
    }
}
