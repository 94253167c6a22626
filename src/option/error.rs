use std::fmt::Display;

use serde::de;
use thiserror::Error;

use crate::template::TemplateError;

/// Boxed error returned by a type's own text parser.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("failed to evaluate template '{input}': {source}")]
    TemplateEvaluation {
        input: String,
        source: TemplateError,
    },

    /// The target type's text parser rejected the value. `source` is the
    /// parser's error as returned.
    #[error("{source}")]
    DirectParse {
        type_name: &'static str,
        source: BoxError,
    },

    #[error("cannot convert '{resolved}' into {type_name}")]
    UnsupportedConversion {
        type_name: &'static str,
        resolved: String,
        source: CoercionError,
    },
}

/// Failure of the loose scalar coercion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct CoercionError(String);

impl de::Error for CoercionError {
    fn custom<T: Display>(msg: T) -> Self {
        Self(msg.to_string())
    }
}
