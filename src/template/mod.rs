//! Template evaluation for raw configuration strings.
//!
//! Configuration values may embed `{{ ... }}` actions that are resolved
//! right before a value is converted to its target type. The decode core only
//! depends on the [`TemplateEvaluator`] trait; [`Evaluator`] is the default
//! implementation.

mod error;
mod evaluator;

pub use error::TemplateError;
pub use evaluator::Evaluator;

use serde_json::Value;

/// Variables visible to template actions as `.path.to.key`.
pub type Context = serde_json::Map<String, Value>;

/// Resolves template actions inside a string.
///
/// Implementations must be pure and reentrant: the same input and context
/// always produce the same output, and concurrent calls do not interfere.
pub trait TemplateEvaluator: Send + Sync {
    fn evaluate(&self, input: &str, context: &Context) -> Result<String, TemplateError>;
}

impl<F> TemplateEvaluator for F
where
    F: Fn(&str, &Context) -> Result<String, TemplateError> + Send + Sync,
{
    fn evaluate(&self, input: &str, context: &Context) -> Result<String, TemplateError> {
        self(input, context)
    }
}

/// Renders a raw value as text.
///
/// Strings are returned verbatim, numbers and booleans in their natural form
/// and composites as compact JSON. `serde_json` keeps object keys sorted, so
/// the output is deterministic.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
