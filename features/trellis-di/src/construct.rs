use std::{
    any::{type_name, Any, TypeId},
    collections::VecDeque,
    sync::Arc,
};

use crate::types::{DynError, Injectable, Instance, TypeInfo};

type BoxedAny = Box<dyn Any + Send + Sync>;

/// One constructor argument supplied by the caller of resolve
pub struct Argument {
    pub(crate) info: TypeInfo,
    pub(crate) value: BoxedAny,
}
impl Argument {
    pub fn new<T: Injectable>(value: T) -> Self {
        Argument {
            info: TypeInfo::of::<T>(),
            value: Box::new(value),
        }
    }

    pub fn info(&self) -> TypeInfo {
        self.info
    }
}

/// The ordered constructor arguments of one resolve call
#[derive(Default)]
pub struct Arguments(Vec<Argument>);
impl Arguments {
    pub fn new() -> Self {
        Arguments(Vec::new())
    }

    pub fn with<T: Injectable>(mut self, value: T) -> Self {
        self.0.push(Argument::new(value));
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn into_vec(self) -> Vec<Argument> {
        self.0
    }
}

/// Shorthand for building [`Arguments`]
#[macro_export]
macro_rules! arguments {
    () => { $crate::Arguments::new() };
    ($($value:expr),+ $(,)?) => { $crate::Arguments::new()$(.with($value))+ };
}

type WideningFn = Arc<dyn Fn(BoxedAny) -> BoxedAny + Send + Sync>;
type InstanceFn = Arc<dyn Fn(Instance) -> Result<BoxedAny, &'static str> + Send + Sync>;

#[derive(Clone)]
struct Widening {
    source: TypeInfo,
    convert: WideningFn,
}

/// One declared constructor parameter
///
/// A `value` parameter is only satisfied by a supplied argument. A `contract`
/// parameter is satisfied by a supplied `Arc<C>` or, when resolving without
/// arguments, recursively through the container. Widenings declare the
/// additional source types a parameter accepts, with the conversion compiled
/// at the declaration site.
#[derive(Clone)]
pub struct ParamSpec {
    info: TypeInfo,
    argument_type: TypeId,
    resolve_as: Option<TypeInfo>,
    from_instance: Option<InstanceFn>,
    widenings: Vec<Widening>,
}

impl ParamSpec {
    /// A plain value parameter, e.g. a connection string or a port
    pub fn value<T: Injectable>() -> Self {
        ParamSpec {
            info: TypeInfo::of::<T>(),
            argument_type: TypeId::of::<T>(),
            resolve_as: None,
            from_instance: None,
            widenings: Vec::new(),
        }
    }

    /// A parameter that is itself a registered contract
    pub fn contract<C: Injectable + ?Sized>() -> Self {
        ParamSpec {
            info: TypeInfo::of::<C>(),
            argument_type: TypeId::of::<Arc<C>>(),
            resolve_as: Some(TypeInfo::of::<C>()),
            from_instance: Some(Arc::new(|instance: Instance| {
                instance
                    .downcast::<C>()
                    .map(|object| Box::new(object) as BoxedAny)
            })),
            widenings: Vec::new(),
        }
    }

    /// Declare an additional source type this parameter accepts
    ///
    /// This is the explicit form of assignability: the conversion is written
    /// where both types are statically known, e.g. `|p: Arc<Admin>| p as Arc<dyn Principal>`.
    pub fn accepting<S: Injectable, T: Injectable>(mut self, convert: fn(S) -> T) -> Self {
        self.widenings.push(Widening {
            source: TypeInfo::of::<S>(),
            convert: Arc::new(move |boxed| {
                let source = boxed
                    .downcast::<S>()
                    .expect("widening source was checked by TypeId before conversion");
                Box::new(convert(*source))
            }),
        });
        self
    }

    pub fn info(&self) -> TypeInfo {
        self.info
    }

    pub(crate) fn resolve_target(&self) -> Option<TypeInfo> {
        self.resolve_as
    }

    pub(crate) fn instance_converter(&self) -> Option<&InstanceFn> {
        self.from_instance.as_ref()
    }

    pub(crate) fn matches(&self, argument: &Argument) -> bool {
        argument.info.type_id == self.argument_type
            || self
                .widenings
                .iter()
                .any(|w| w.source.type_id == argument.info.type_id)
    }

    pub(crate) fn convert(&self, argument: Argument) -> BoxedAny {
        if argument.info.type_id == self.argument_type {
            return argument.value;
        }
        let widening = self
            .widenings
            .iter()
            .find(|w| w.source.type_id == argument.info.type_id)
            .expect("convert is only called after matches succeeded");
        (widening.convert)(argument.value)
    }
}

/// The matched argument values handed to a constructor closure, in
/// declared parameter order
pub struct ResolvedArgs {
    values: VecDeque<BoxedAny>,
}

impl ResolvedArgs {
    pub(crate) fn new(values: Vec<BoxedAny>) -> Self {
        ResolvedArgs {
            values: values.into(),
        }
    }

    /// Take the next value parameter
    pub fn next<T: Injectable>(&mut self) -> Result<T, DynError> {
        let value = self
            .values
            .pop_front()
            .ok_or("constructor consumed more arguments than it declared")?;
        match value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(_) => Err(format!(
                "constructor argument had an unexpected type, wanted '{}'",
                type_name::<T>()
            )
            .into()),
        }
    }

    /// Take the next contract parameter
    pub fn contract<C: Injectable + ?Sized>(&mut self) -> Result<Arc<C>, DynError> {
        self.next::<Arc<C>>()
    }
}

type BuildFn = Arc<dyn Fn(ResolvedArgs) -> Result<BoxedAny, DynError> + Send + Sync>;

/// One constructor candidate of a component
///
/// The closure receives the matched arguments and returns the concrete
/// value; the container unsizes it to the contract afterwards so property
/// injection can still mutate it.
#[derive(Clone)]
pub struct Constructor {
    params: Vec<ParamSpec>,
    build: BuildFn,
}

impl Constructor {
    pub fn new<T, F>(params: Vec<ParamSpec>, build: F) -> Self
    where
        T: Injectable,
        F: Fn(&mut ResolvedArgs) -> Result<T, DynError> + Send + Sync + 'static,
    {
        Constructor {
            params,
            build: Arc::new(move |mut args| build(&mut args).map(|value| Box::new(value) as BoxedAny)),
        }
    }

    /// A zero-parameter constructor
    pub fn nullary<T, F>(make: F) -> Self
    where
        T: Injectable,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Constructor::new(Vec::new(), move |_| Ok(make()))
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub(crate) fn build(&self, args: ResolvedArgs) -> Result<BoxedAny, DynError> {
        (self.build)(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_params_match_by_exact_type() {
        let param = ParamSpec::value::<String>();
        assert!(param.matches(&Argument::new("x".to_string())));
        assert!(!param.matches(&Argument::new(1_u32)));
    }

    #[test]
    fn widening_converts_a_declared_source() {
        let param = ParamSpec::value::<u64>().accepting::<u32, u64>(|small| small as u64);
        let argument = Argument::new(7_u32);
        assert!(param.matches(&argument));
        let value = param.convert(argument);
        assert_eq!(*value.downcast::<u64>().unwrap(), 7);
    }

    #[test]
    fn resolved_args_are_consumed_in_order() {
        let mut args = ResolvedArgs::new(vec![Box::new(1_u32), Box::new("a".to_string())]);
        assert_eq!(args.next::<u32>().unwrap(), 1);
        assert_eq!(args.next::<String>().unwrap(), "a");
        assert!(args.next::<u32>().is_err());
    }
}
