//! Target-type capabilities.
//!
//! Every type an [`Optional`](super::Optional) can decode into implements
//! [`ConfigValue`]. A type that knows how to parse itself from text also
//! implements [`TextParse`] and advertises it through
//! [`ConfigValue::text_parser`]; the [`config_value!`](crate::config_value)
//! macro wires either case up.

use std::any::type_name;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;

use serde::de::DeserializeOwned;

use super::BoxError;

/// Parser registered by a [`TextParse`] type.
pub type TextParser<T> = fn(&str) -> Result<T, BoxError>;

/// Parses a value from resolved text.
///
/// When a type implements this, its result is authoritative: an error is
/// reported as-is and no other conversion is attempted.
pub trait TextParse: Sized {
    type Err: std::error::Error + Send + Sync + 'static;

    fn parse_text(text: &str) -> Result<Self, Self::Err>;
}

/// A type that can be decoded from a templated configuration value.
pub trait ConfigValue: DeserializeOwned {
    /// Returns the type's own text parser, if it has one.
    fn text_parser() -> Option<TextParser<Self>> {
        None
    }
}

/// Adapts [`TextParse::parse_text`] to a [`TextParser`].
pub fn parse_boxed<T: TextParse>(text: &str) -> Result<T, BoxError> {
    T::parse_text(text).map_err(Into::into)
}

/// Implements [`ConfigValue`] for the listed types.
///
/// Prefix the list with `text:` for types that implement [`TextParse`].
///
/// ```
/// use serde::Deserialize;
/// use tmplcfg::option::TextParse;
///
/// #[derive(Deserialize)]
/// struct Level(u8);
///
/// #[derive(Deserialize)]
/// struct Hex(u32);
///
/// impl TextParse for Hex {
///     type Err = std::num::ParseIntError;
///
///     fn parse_text(text: &str) -> Result<Self, Self::Err> {
///         u32::from_str_radix(text.trim_start_matches("0x"), 16).map(Hex)
///     }
/// }
///
/// tmplcfg::config_value!(Level);
/// tmplcfg::config_value!(text: Hex);
/// ```
#[macro_export]
macro_rules! config_value {
    (text: $($ty:ty),+ $(,)?) => {
        $(
            impl $crate::option::ConfigValue for $ty {
                fn text_parser() -> ::std::option::Option<$crate::option::TextParser<Self>> {
                    ::std::option::Option::Some($crate::option::parse_boxed::<Self>)
                }
            }
        )+
    };
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::option::ConfigValue for $ty {}
        )+
    };
}

config_value!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    String, PathBuf, serde_json::Value, (),
);

macro_rules! text_parse_from_str {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl TextParse for $ty {
                type Err = <$ty as std::str::FromStr>::Err;

                fn parse_text(text: &str) -> Result<Self, Self::Err> {
                    text.parse()
                }
            }
        )+
    };
}

text_parse_from_str!(IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr);
config_value!(text: IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr);

impl<T: ConfigValue> ConfigValue for Option<T> {}
impl<T: ConfigValue> ConfigValue for Vec<T> {}
impl<V: ConfigValue> ConfigValue for HashMap<String, V> {}
impl<V: ConfigValue> ConfigValue for BTreeMap<String, V> {}

/// What a decode call knows about its target type.
pub struct TypeDescriptor<T> {
    name: &'static str,
    text_parser: Option<TextParser<T>>,
}

impl<T: ConfigValue> TypeDescriptor<T> {
    /// Inspects `T`.
    pub fn of() -> Self {
        Self {
            name: type_name::<T>(),
            text_parser: T::text_parser(),
        }
    }
}

impl<T> TypeDescriptor<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether `T` parses itself from text.
    pub fn parses_text(&self) -> bool {
        self.text_parser.is_some()
    }

    pub fn text_parser(&self) -> Option<TextParser<T>> {
        self.text_parser
    }
}

impl<T> Clone for TypeDescriptor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypeDescriptor<T> {}

impl<T> fmt::Debug for TypeDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("parses_text", &self.parses_text())
            .finish()
    }
}
