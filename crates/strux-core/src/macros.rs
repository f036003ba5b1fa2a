/// Declare a record type with a closed field set.
///
/// Every field is stored as a [`Value`](crate::Value). A field may carry a
/// default expression (anything convertible into `Value`); fields without
/// one default to `Value::Null`.
///
/// The macro derives `Debug`, `Clone` and `PartialEq`, implements `Default`,
/// [`StructType`](crate::StructType), [`Structure`](crate::Structure),
/// `serde::Serialize` and `From<T> for Value`.
///
/// ```
/// strux_core::structure! {
///     /// A postal address.
///     pub struct Address {
///         pub street,
///         pub city,
///         pub country = "NZ",
///     }
/// }
///
/// use strux_core::{StructType, UnknownKeys, Value};
///
/// let address = Address::from_map([("city", "Auckland")], UnknownKeys::Reject).unwrap();
/// assert_eq!(address.country, Value::from("NZ"));
/// assert!(address.street.is_null());
/// ```
#[macro_export]
macro_rules! structure {
    (@default) => {
        $crate::Value::Null
    };
    (@default $default:expr) => {
        $crate::Value::from($default)
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident $(= $default:expr)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $crate::Value,
            )*
        }

        impl ::core::default::Default for $name {
            fn default() -> Self {
                Self {
                    $( $field: $crate::structure!(@default $($default)?), )*
                }
            }
        }

        impl $crate::StructType for $name {
            const TYPE_NAME: &'static str = stringify!($name);
            const FIELDS: &'static [&'static str] = &[$(stringify!($field)),*];
        }

        impl $crate::Structure for $name {
            fn type_name(&self) -> &'static str {
                <Self as $crate::StructType>::TYPE_NAME
            }

            fn field_names(&self) -> &'static [&'static str] {
                <Self as $crate::StructType>::FIELDS
            }

            #[allow(unused_variables)]
            fn field(&self, name: &str) -> ::core::option::Option<&$crate::Value> {
                match name {
                    $( stringify!($field) => ::core::option::Option::Some(&self.$field), )*
                    _ => ::core::option::Option::None,
                }
            }

            #[allow(unused_variables)]
            fn field_mut(&mut self, name: &str) -> ::core::option::Option<&mut $crate::Value> {
                match name {
                    $( stringify!($field) => ::core::option::Option::Some(&mut self.$field), )*
                    _ => ::core::option::Option::None,
                }
            }

            fn clone_boxed(&self) -> ::std::boxed::Box<dyn $crate::Structure> {
                ::std::boxed::Box::new(::core::clone::Clone::clone(self))
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }
        }

        impl ::core::convert::From<$name> for $crate::Value {
            fn from(record: $name) -> Self {
                $crate::Value::Struct(::std::boxed::Box::new(record))
            }
        }

        impl $crate::__serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: $crate::__serde::Serializer,
            {
                $crate::__serde::Serialize::serialize(self as &dyn $crate::Structure, serializer)
            }
        }
    };
}

/// Build a [`FieldMap`](crate::FieldMap) from `key => value` pairs.
///
/// ```
/// let map = strux_core::field_map! { "name" => "Ada", "age" => 36 };
/// assert_eq!(map.len(), 2);
/// ```
#[macro_export]
macro_rules! field_map {
    ($($key:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut map = $crate::FieldMap::new();
        $( map.insert($key, $crate::Value::from($value)); )*
        map
    }};
}
