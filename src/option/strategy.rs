//! Ordered conversion of a resolved string into a target type.

use serde::Deserialize;

use super::capability::{ConfigValue, TypeDescriptor};
use super::loose::LooseDeserializer;
use super::DecodeError;

/// A single conversion attempt, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// The type's own [`TextParse`](super::TextParse) implementation.
    DirectText,
    /// The string parsed as a JSON literal.
    StructuredLiteral,
    /// The string treated as one loosely-typed scalar.
    LooseMapping,
}

impl Strategy {
    pub const CHAIN: [Strategy; 3] = [
        Strategy::DirectText,
        Strategy::StructuredLiteral,
        Strategy::LooseMapping,
    ];

    /// Runs this strategy. `None` means it does not apply or failed without
    /// being authoritative, so the next one gets a turn.
    fn attempt<T: ConfigValue>(
        self,
        ty: &TypeDescriptor<T>,
        resolved: &str,
    ) -> Option<Result<T, DecodeError>> {
        match self {
            Self::DirectText => {
                let parse = ty.text_parser()?;
                Some(parse(resolved).map_err(|source| DecodeError::DirectParse {
                    type_name: ty.name(),
                    source,
                }))
            }
            Self::StructuredLiteral => serde_json::from_str(resolved).ok().map(Ok),
            Self::LooseMapping => Some(loose_mapping(ty, resolved)),
        }
    }
}

fn loose_mapping<T: ConfigValue>(ty: &TypeDescriptor<T>, resolved: &str) -> Result<T, DecodeError> {
    T::deserialize(LooseDeserializer::new(resolved)).map_err(|source| {
        DecodeError::UnsupportedConversion {
            type_name: ty.name(),
            resolved: resolved.to_string(),
            source,
        }
    })
}

/// Runs the strategy chain, returning the value and the strategy that produced it.
pub fn convert<T: ConfigValue>(
    ty: &TypeDescriptor<T>,
    resolved: &str,
) -> Result<(T, Strategy), DecodeError> {
    let [leading @ .., last] = Strategy::CHAIN;
    for strategy in leading {
        if let Some(outcome) = strategy.attempt(ty, resolved) {
            return outcome.map(|value| (value, strategy));
        }
    }

    // The last strategy always decides.
    loose_mapping(ty, resolved).map(|value| (value, last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::option::TextParse;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, thiserror::Error)]
    #[error("bad format")]
    struct BadFormat;

    /// Always rejects its input, even when it is valid JSON.
    #[derive(Debug, PartialEq, Deserialize)]
    struct Strict(i64);

    impl TextParse for Strict {
        type Err = BadFormat;

        fn parse_text(_text: &str) -> Result<Self, Self::Err> {
            Err(BadFormat)
        }
    }

    crate::config_value!(text: Strict);

    fn run<T: ConfigValue>(resolved: &str) -> Result<(T, Strategy), DecodeError> {
        convert(&TypeDescriptor::<T>::of(), resolved)
    }

    #[test]
    fn test_structured_literal_for_int() {
        let (value, strategy) = run::<i64>("42").unwrap();
        assert_eq!(value, 42);
        assert_eq!(strategy, Strategy::StructuredLiteral);
    }

    #[test]
    fn test_structured_literal_for_collections() {
        let (value, _) = run::<HashMap<String, Vec<u8>>>(r#"{"a": [1, 2]}"#).unwrap();
        assert_eq!(value["a"], vec![1, 2]);
    }

    #[test]
    fn test_bare_string_falls_to_loose_mapping() {
        let (value, strategy) = run::<String>("hello").unwrap();
        assert_eq!(value, "hello");
        assert_eq!(strategy, Strategy::LooseMapping);
    }

    #[test]
    fn test_numeric_string_into_string() {
        let (value, strategy) = run::<String>("42").unwrap();
        assert_eq!(value, "42");
        assert_eq!(strategy, Strategy::LooseMapping);
    }

    #[test]
    fn test_direct_text_used_first() {
        let (value, strategy) = run::<std::net::IpAddr>("10.0.0.1").unwrap();
        assert_eq!(value, "10.0.0.1".parse::<std::net::IpAddr>().unwrap());
        assert_eq!(strategy, Strategy::DirectText);
    }

    #[test]
    fn test_direct_text_error_is_terminal() {
        let err = run::<Strict>("42").unwrap_err();
        match err {
            DecodeError::DirectParse { source, .. } => {
                assert!(source.downcast_ref::<BadFormat>().is_some());
                assert_eq!(source.to_string(), "bad format");
            }
            other => panic!("expected DirectParse, got {other:?}"),
        }
    }

    #[test]
    fn test_unsupported_conversion() {
        let err = run::<u16>("not a number").unwrap_err();
        match err {
            DecodeError::UnsupportedConversion {
                type_name,
                resolved,
                source,
            } => {
                assert_eq!(type_name, "u16");
                assert_eq!(resolved, "not a number");
                assert!(!source.to_string().is_empty());
            }
            other => panic!("expected UnsupportedConversion, got {other:?}"),
        }
    }

    #[test]
    fn test_chain_order() {
        assert_eq!(
            Strategy::CHAIN,
            [
                Strategy::DirectText,
                Strategy::StructuredLiteral,
                Strategy::LooseMapping
            ]
        );
    }
}
