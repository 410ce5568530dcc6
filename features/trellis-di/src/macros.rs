/// Declare a contract trait together with its forwarding proxy
///
/// This is the Rust rendition of runtime proxy generation: the proxy type
/// is compiled alongside the trait. Every generated method boxes its
/// arguments, precomputes the stub argument key, routes the call through
/// the interceptor chain, and unboxes the return value - producing the
/// return type's `Default` when nothing set it.
///
/// Method parameters must be owned `Hash` types and return types must
/// implement `Default`; methods must be dyn-compatible.
///
/// ```
/// use trellis_di::proxy_contract;
///
/// proxy_contract! {
///     pub trait Greeter => GreeterProxy {
///         fn greet(&self, name: String) -> String;
///     }
/// }
/// ```
#[macro_export]
macro_rules! proxy_contract {
    (
        $(#[$trait_attr:meta])*
        $vis:vis trait $contract:ident => $proxy:ident {
            $(
                $(#[$method_attr:meta])*
                fn $method:ident(&self $(, $arg:ident : $arg_ty:ty)* $(,)?) $(-> $ret:ty)?;
            )*
        }
    ) => {
        $(#[$trait_attr])*
        $vis trait $contract: ::std::marker::Send + ::std::marker::Sync {
            $(
                $(#[$method_attr])*
                fn $method(&self $(, $arg: $arg_ty)*) $(-> $ret)?;
            )*
        }

        /// Forwarding proxy - every call routes through the interceptor
        /// chain before (maybe) reaching the wrapped target.
        $vis struct $proxy {
            target: ::std::option::Option<::std::sync::Arc<dyn $contract>>,
            chain: $crate::DispatchChain,
        }

        impl $contract for $proxy {
            $(
                fn $method(&self $(, $arg: $arg_ty)*) $(-> $ret)? {
                    let argument_key = $crate::proxy_contract!(@key $($arg),*);
                    let target = self.target.clone();
                    let invocation = $crate::Invocation::new(
                        $crate::TypeInfo::of::<dyn $contract>(),
                        stringify!($method),
                        ::std::vec![$(::std::boxed::Box::new($arg) as $crate::BoxedValue),*],
                        argument_key,
                        $crate::TypeInfo::of::<($($ret)?)>(),
                        self.chain.clone(),
                        target.map(|target| -> $crate::TargetCall {
                            ::std::boxed::Box::new(move |_arguments| {
                                let result = target.$method(
                                    $($crate::take_argument::<$arg_ty>(
                                        _arguments,
                                        stringify!($method),
                                        stringify!($arg),
                                    )),*
                                );
                                ::std::option::Option::Some(
                                    ::std::boxed::Box::new(result) as $crate::BoxedValue
                                )
                            })
                        }),
                    );
                    invocation.finish::<($($ret)?)>()
                }
            )*
        }

        impl $crate::Proxyable for dyn $contract {
            fn proxy_binding() -> $crate::ProxyBinding {
                $crate::ProxyBinding::new::<dyn $contract>(|target, chain| {
                    ::std::sync::Arc::new($proxy { target, chain })
                })
            }
        }
    };

    (@key) => { ::std::option::Option::None };
    (@key $($arg:ident),+) => {
        ::std::option::Option::Some($crate::argument_key(&($(&$arg,)+)))
    };
}
