use std::sync::Arc;

use trellis_di::{
    proxy_contract, Constructor, DiContainer, Interceptor, Invocation, ModuleInfo, Registration,
};

proxy_contract! {
    pub trait Pipeline => PipelineProxy {
        fn run(&self, input: String) -> String;
        fn flush(&self);
    }
}

struct Uppercase;
impl Pipeline for Uppercase {
    fn run(&self, input: String) -> String {
        input.to_uppercase()
    }

    fn flush(&self) {}
}

/// A target that must never be called
struct Exploding;
impl Pipeline for Exploding {
    fn run(&self, _input: String) -> String {
        panic!("the target must not be reached")
    }

    fn flush(&self) {
        panic!("the target must not be reached")
    }
}

/// Appends its tag to the string argument, so the interceptor order is
/// visible in the target's input
#[derive(Default)]
struct TagA;
impl Interceptor for TagA {
    fn intercept(&self, invocation: &mut Invocation) {
        if let Some(input) = invocation.argument::<String>(0) {
            let tagged = format!("{input}a");
            invocation.replace_argument(0, tagged);
        }
        invocation.proceed();
    }
}

#[derive(Default)]
struct TagB;
impl Interceptor for TagB {
    fn intercept(&self, invocation: &mut Invocation) {
        if let Some(input) = invocation.argument::<String>(0) {
            let tagged = format!("{input}b");
            invocation.replace_argument(0, tagged);
        }
        invocation.proceed();
    }
}

/// Serves a canned value and never proceeds
#[derive(Default)]
struct Cutoff;
impl Interceptor for Cutoff {
    fn intercept(&self, invocation: &mut Invocation) {
        invocation.set_return_value("cut".to_string());
    }
}

/// Proceeds, then rewrites the returned value
#[derive(Default)]
struct Suffix;
impl Interceptor for Suffix {
    fn intercept(&self, invocation: &mut Invocation) {
        invocation.proceed();
        if let Some(output) = invocation.return_value::<String>() {
            let rewritten = format!("{output}!");
            invocation.set_return_value(rewritten);
        }
    }
}

fn pipeline_with<F>(attach: F) -> Arc<dyn Pipeline>
where
    F: FnOnce(Registration<dyn Pipeline>) -> Registration<dyn Pipeline>,
{
    let container = DiContainer::new();
    let registration = Registration::<dyn Pipeline>::for_contract()
        .implemented_by::<Uppercase>(|pipeline| pipeline as Arc<dyn Pipeline>)
        .constructor(Constructor::nullary(|| Uppercase));
    container.register(attach(registration)).unwrap();
    container.resolve::<dyn Pipeline>().unwrap()
}

#[test]
fn interceptors_run_in_registration_order() {
    let pipeline = pipeline_with(|registration| {
        registration.interceptor::<TagA>().interceptor::<TagB>()
    });
    assert_eq!(pipeline.run("x".into()), "XAB");
}

#[test]
fn a_duplicate_interceptor_type_is_attached_once() {
    let pipeline = pipeline_with(|registration| {
        registration.interceptor::<TagA>().interceptor::<TagA>()
    });
    assert_eq!(pipeline.run("x".into()), "XA");
}

#[test]
fn a_short_circuiting_interceptor_skips_the_target() {
    let container = DiContainer::new();
    container
        .register(
            Registration::<dyn Pipeline>::for_contract()
                .implemented_by::<Exploding>(|pipeline| pipeline as Arc<dyn Pipeline>)
                .constructor(Constructor::nullary(|| Exploding))
                .interceptor::<Cutoff>(),
        )
        .unwrap();
    let pipeline = container.resolve::<dyn Pipeline>().unwrap();
    assert_eq!(pipeline.run("x".into()), "cut");
}

#[test]
fn a_post_processing_interceptor_sees_the_targets_return_value() {
    let pipeline = pipeline_with(|registration| registration.interceptor::<Suffix>());
    assert_eq!(pipeline.run("hey".into()), "HEY!");
}

#[test]
fn unit_methods_pass_through_the_chain() {
    let pipeline = pipeline_with(|registration| registration.interceptor::<TagA>());
    pipeline.flush();
}

#[test]
fn without_interceptors_no_proxy_is_synthesized() {
    let pipeline = pipeline_with(|registration| registration);
    assert_eq!(pipeline.run("plain".into()), "PLAIN");
}

#[test]
fn module_wide_interceptors_cover_every_proxied_registration() {
    let container = DiContainer::new();
    container
        .register_module(
            ModuleInfo::new()
                .register(
                    Registration::<dyn Pipeline>::for_contract()
                        .implemented_by::<Uppercase>(|pipeline| pipeline as Arc<dyn Pipeline>)
                        .constructor(Constructor::nullary(|| Uppercase))
                        .proxied(),
                )
                .interceptor_for_all::<Suffix>(),
        )
        .unwrap();
    let pipeline = container.resolve::<dyn Pipeline>().unwrap();
    assert_eq!(pipeline.run("hey".into()), "HEY!");
}
