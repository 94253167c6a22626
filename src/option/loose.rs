//! Loose coercion of a single scalar string into an arbitrary serde type.
//!
//! This is the last conversion attempted for a resolved value. It accepts a
//! few spellings the JSON parser rejects: bare strings, `yes`/`no`/`on`/`off`
//! booleans, numbers with surrounding whitespace or `_` separators and unit
//! enum variants by name. Sequences and single-field structs receive the
//! scalar as their only element.

use std::str::FromStr;

use serde::de::value::{MapDeserializer, SeqDeserializer, StrDeserializer};
use serde::de::{self, Deserializer, IntoDeserializer, Unexpected, Visitor};

use super::CoercionError;

#[derive(Debug, Clone, Copy)]
pub(crate) struct LooseDeserializer<'de> {
    input: &'de str,
}

impl<'de> LooseDeserializer<'de> {
    pub(crate) fn new(input: &'de str) -> Self {
        Self { input }
    }

    fn invalid<V: Visitor<'de>>(&self, visitor: &V) -> CoercionError {
        de::Error::invalid_value(Unexpected::Str(self.input), visitor)
    }
}

fn parse_number<N: FromStr>(input: &str) -> Option<N> {
    let trimmed = input.trim();
    trimmed.parse().ok().or_else(|| {
        if trimmed.contains('_') {
            trimmed.replace('_', "").parse().ok()
        } else {
            None
        }
    })
}

fn parse_bool(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

macro_rules! deserialize_number {
    ($($method:ident => $visit:ident,)*) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value, Self::Error>
            where
                V: Visitor<'de>,
            {
                match parse_number(self.input) {
                    Some(value) => visitor.$visit(value),
                    None => Err(self.invalid(&visitor)),
                }
            }
        )*
    };
}

impl<'de> IntoDeserializer<'de, CoercionError> for LooseDeserializer<'de> {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

impl<'de> Deserializer<'de> for LooseDeserializer<'de> {
    type Error = CoercionError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_borrowed_str(self.input)
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match parse_bool(self.input) {
            Some(value) => visitor.visit_bool(value),
            None => Err(self.invalid(&visitor)),
        }
    }

    deserialize_number! {
        deserialize_i8 => visit_i8,
        deserialize_i16 => visit_i16,
        deserialize_i32 => visit_i32,
        deserialize_i64 => visit_i64,
        deserialize_i128 => visit_i128,
        deserialize_u8 => visit_u8,
        deserialize_u16 => visit_u16,
        deserialize_u32 => visit_u32,
        deserialize_u64 => visit_u64,
        deserialize_u128 => visit_u128,
        deserialize_f32 => visit_f32,
        deserialize_f64 => visit_f64,
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        let mut chars = self.input.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(self.invalid(&visitor)),
        }
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_borrowed_str(self.input)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_borrowed_str(self.input)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_borrowed_bytes(self.input.as_bytes())
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_borrowed_bytes(self.input.as_bytes())
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        if self.input.trim().is_empty() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        if self.input.trim().is_empty() {
            visitor.visit_unit()
        } else {
            Err(de::Error::invalid_type(Unexpected::Str(self.input), &visitor))
        }
    }

    fn deserialize_unit_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        SeqDeserializer::<_, CoercionError>::new(std::iter::once(self)).deserialize_any(visitor)
    }

    fn deserialize_tuple<V>(self, _len: usize, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        Err(de::Error::invalid_type(Unexpected::Str(self.input), &visitor))
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match fields {
            [field] => MapDeserializer::<_, CoercionError>::new(std::iter::once((*field, self)))
                .deserialize_any(visitor),
            _ => Err(de::Error::invalid_type(Unexpected::Str(self.input), &visitor)),
        }
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        let variant: StrDeserializer<'de, CoercionError> = self.input.trim().into_deserializer();
        variant.deserialize_enum(name, variants, visitor)
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_borrowed_str(self.input)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn coerce<T: Deserialize<'static>>(input: &'static str) -> Result<T, CoercionError> {
        T::deserialize(LooseDeserializer::new(input))
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct Wrapper {
        name: String,
    }

    #[derive(Debug, PartialEq, Deserialize)]
    #[serde(rename_all = "lowercase")]
    enum Mode {
        Fast,
        Slow,
    }

    #[test]
    fn test_bool_words() {
        assert_eq!(coerce::<bool>("yes"), Ok(true));
        assert_eq!(coerce::<bool>(" OFF "), Ok(false));
        assert!(coerce::<bool>("maybe").is_err());
    }

    #[test]
    fn test_numbers() {
        assert_eq!(coerce::<u32>(" 42 "), Ok(42));
        assert_eq!(coerce::<i64>("1_000_000"), Ok(1_000_000));
        assert_eq!(coerce::<f64>("2.5"), Ok(2.5));
        assert!(coerce::<u8>("300").is_err());
        assert!(coerce::<i32>("abc").is_err());
    }

    #[test]
    fn test_single_field_struct_wraps_scalar() {
        assert_eq!(
            coerce::<Wrapper>("hello world"),
            Ok(Wrapper {
                name: "hello world".into()
            })
        );
    }

    #[test]
    fn test_unit_variant_by_name() {
        assert_eq!(coerce::<Mode>("slow"), Ok(Mode::Slow));
        assert!(coerce::<Mode>("medium").is_err());
    }

    #[test]
    fn test_sequence_wraps_scalar() {
        assert_eq!(coerce::<Vec<String>>("only"), Ok(vec!["only".to_string()]));
    }

    #[test]
    fn test_map_rejected() {
        assert!(coerce::<std::collections::HashMap<String, String>>("a=b").is_err());
    }

    #[test]
    fn test_char() {
        assert_eq!(coerce::<char>("x"), Ok('x'));
        assert!(coerce::<char>("xy").is_err());
    }
}
