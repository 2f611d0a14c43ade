/// Implement [`Record`](crate::Record) for a plain struct.
///
/// Each entry is `kind field[: Type] as "DeclaredName" [tag = "value", ...]`
/// where `kind` is one of:
///
/// - `leaf`: a terminal value (`Serialize + DeserializeOwned`)
/// - `nested`: a named sub-record, keys composed under its name
/// - `embed`: an embedded sub-record, keys exposed at the parent level
/// - `private`: not addressable, never mapped
///
/// `nested` and `embed` entries must name the field type.
///
/// ```ignore
/// struct Database { url: String, pool_size: u32 }
/// struct AppConfig { port: u16, database: Database }
///
/// configflow::record! {
///     Database {
///         leaf url as "Url" [env = "DATABASE_URL"],
///         leaf pool_size as "PoolSize",
///     }
/// }
///
/// configflow::record! {
///     AppConfig {
///         leaf port as "Port",
///         nested database: Database as "Database",
///     }
/// }
/// ```
#[macro_export]
macro_rules! record {
    (@shape leaf $name:literal) => {
        $crate::FieldShape::leaf($name)
    };
    (@shape nested $name:literal : $fty:ty) => {
        $crate::FieldShape::nested::<$fty>($name)
    };
    (@shape embed $name:literal : $fty:ty) => {
        $crate::FieldShape::embedded::<$fty>($name)
    };
    (@shape private $name:literal $( : $fty:ty )?) => {
        $crate::FieldShape::private($name)
    };

    (@ref leaf $e:expr) => {
        ::core::option::Option::Some($crate::FieldRef::Leaf(&$e))
    };
    (@ref nested $e:expr) => {
        ::core::option::Option::Some($crate::FieldRef::Record(&$e))
    };
    (@ref embed $e:expr) => {
        ::core::option::Option::Some($crate::FieldRef::Record(&$e))
    };
    (@ref private $e:expr) => {
        ::core::option::Option::None
    };

    (@mut leaf $e:expr) => {
        ::core::option::Option::Some($crate::FieldMut::Leaf(&mut $e))
    };
    (@mut nested $e:expr) => {
        ::core::option::Option::Some($crate::FieldMut::Record(&mut $e))
    };
    (@mut embed $e:expr) => {
        ::core::option::Option::Some($crate::FieldMut::Record(&mut $e))
    };
    (@mut private $e:expr) => {
        ::core::option::Option::None
    };

    (
        $ty:ty {
            $(
                $kind:ident $field:ident $( : $fty:ty )? as $name:literal
                $( [ $( $tag:ident = $val:literal ),* $(,)? ] )?
            ),* $(,)?
        }
    ) => {
        impl $crate::Record for $ty {
            fn shape() -> $crate::RecordShape {
                $crate::RecordShape::new::<Self>()
                    $(
                        .field(
                            $crate::record!(@shape $kind $name $( : $fty )?)
                                $( $( .tag(stringify!($tag), $val) )* )?
                        )
                    )*
            }

            #[allow(unused_mut, unused_assignments, unused_variables)]
            fn field(&self, index: usize) -> ::core::option::Option<$crate::FieldRef<'_>> {
                let mut position = 0usize;
                $(
                    if index == position {
                        return $crate::record!(@ref $kind self.$field);
                    }
                    position += 1;
                )*
                ::core::option::Option::None
            }

            #[allow(unused_mut, unused_assignments, unused_variables)]
            fn field_mut(&mut self, index: usize) -> ::core::option::Option<$crate::FieldMut<'_>> {
                let mut position = 0usize;
                $(
                    if index == position {
                        return $crate::record!(@mut $kind self.$field);
                    }
                    position += 1;
                )*
                ::core::option::Option::None
            }
        }
    };
}
