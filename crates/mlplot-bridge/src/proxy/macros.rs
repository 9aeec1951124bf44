/// Declares a typed proxy for one owner kind.
///
/// ```ignore
/// remote_proxy! {
///     pub struct FigureProxy for "figure" {
///         attribute title: String => title, set_title;
///         attribute layout_type: String => layout_type;
///         method raise_window => raise_window;
///     }
/// }
/// ```
///
/// Attributes come first, then methods. Each attribute gets a getter and,
/// if a setter name is given, a setter that returns before the owner applies
/// it. Each method gets a caller taking [`crate::CallArgs`].
#[macro_export]
macro_rules! remote_proxy {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident for $kind:literal {
            $( attribute $attr:ident : $ty:ty => $getter:ident $(, $setter:ident)?; )*
            $( method $method:ident => $caller:ident; )*
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            proxy: $crate::proxy::Proxy,
        }

        impl $name {
            pub const SCHEMA: $crate::proxy::ProxySchema = $crate::proxy::ProxySchema::new(
                $kind,
                &[
                    $( (stringify!($attr), $crate::proxy::MemberKind::Attribute), )*
                    $( (stringify!($method), $crate::proxy::MemberKind::Method), )*
                ],
            );

            pub fn create(
                ctx: &$crate::WorkerContext,
                args: $crate::CallArgs,
            ) -> ::std::result::Result<Self, $crate::ProxyError> {
                let class = ctx.class(&Self::SCHEMA)?;
                Ok(Self {
                    proxy: class.create(args)?,
                })
            }

            pub fn attach(
                ctx: &$crate::WorkerContext,
                index: $crate::ObjectIndex,
            ) -> ::std::result::Result<Self, $crate::ProxyError> {
                let class = ctx.class(&Self::SCHEMA)?;
                Ok(Self {
                    proxy: $crate::proxy::Proxy::attach(class, index),
                })
            }

            pub fn proxy(&self) -> &$crate::proxy::Proxy {
                &self.proxy
            }

            pub fn index(&self) -> $crate::ObjectIndex {
                self.proxy.index()
            }

            pub fn delete(&self) -> ::std::result::Result<(), $crate::ProxyError> {
                self.proxy.delete()
            }

            $(
                pub fn $getter(&self) -> ::std::result::Result<$ty, $crate::ProxyError> {
                    self.proxy.get::<$ty>(stringify!($attr))
                }

                $(
                    pub fn $setter(
                        &self,
                        value: $ty,
                    ) -> ::std::result::Result<(), $crate::ProxyError> {
                        self.proxy.set::<$ty>(stringify!($attr), value)
                    }
                )?
            )*

            $(
                pub fn $caller(
                    &self,
                    args: $crate::CallArgs,
                ) -> ::std::result::Result<$crate::Value, $crate::ProxyError> {
                    self.proxy.call(stringify!($method), args)
                }
            )*
        }

        impl $crate::proxy::ProxyHandle for $name {
            fn index(&self) -> $crate::ObjectIndex {
                self.proxy.index()
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("index", &self.proxy.index())
                    .field("deleted", &self.proxy.is_deleted())
                    .finish()
            }
        }
    };
}
