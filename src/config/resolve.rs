//! Variable reference resolution for configuration values.
//!
//! Supports `${section.field}` syntax for cross-referencing values within config.
//! Use `$${...}` to escape and produce a literal `${...}`.

use serde_json::{Map, Value};
use tracing::debug;

use super::ConfigError;

/// Resolves all `${path.to.field}` references in the configuration table.
///
/// Iteratively resolves references until no more substitutions are made, then
/// collapses `$$` escapes once.
/// Returns an error if a circular reference is detected or a referenced path doesn't exist.
pub fn resolve_references(table: &mut Map<String, Value>) -> Result<(), ConfigError> {
    const MAX_ITERATIONS: usize = 100;

    for pass in 0..MAX_ITERATIONS {
        let snapshot = table.clone();
        let substitutions = resolve_pass(table, &snapshot)?;
        if substitutions == 0 {
            table.values_mut().for_each(unescape_value);
            debug!(passes = pass + 1, "resolved configuration references");
            return Ok(());
        }
    }

    Err(ConfigError::CircularReference)
}

/// Performs a single resolution pass over all string values.
/// Returns the number of substitutions made.
fn resolve_pass(table: &mut Map<String, Value>, root: &Map<String, Value>) -> Result<usize, ConfigError> {
    let mut count = 0;

    for value in table.values_mut() {
        count += resolve_value(value, root)?;
    }

    Ok(count)
}

/// Resolves references in a single value (recursively for tables/arrays).
fn resolve_value(value: &mut Value, root: &Map<String, Value>) -> Result<usize, ConfigError> {
    match value {
        Value::String(s) => resolve_string(s, root),
        Value::Object(t) => resolve_pass(t, root),
        Value::Array(arr) => {
            let mut count = 0;
            for item in arr.iter_mut() {
                count += resolve_value(item, root)?;
            }
            Ok(count)
        }
        _ => Ok(0),
    }
}

/// Resolves all `${...}` references in a string.
/// `$$` is copied through unchanged so later passes still see the escape.
fn resolve_string(s: &mut String, root: &Map<String, Value>) -> Result<usize, ConfigError> {
    let mut result = String::with_capacity(s.len());
    let mut substitutions = 0;
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' {
            match chars.peek() {
                Some('$') => {
                    chars.next();
                    result.push_str("$$");
                }
                Some('{') => {
                    chars.next(); // consume '{'
                    let path = consume_until(&mut chars, '}')
                        .ok_or(ConfigError::UnclosedReference)?;

                    let resolved = lookup_path(root, &path)?;
                    result.push_str(&resolved);
                    substitutions += 1;
                }
                _ => {
                    result.push('$');
                }
            }
        } else {
            result.push(ch);
        }
    }

    *s = result;
    Ok(substitutions)
}

fn unescape_value(value: &mut Value) {
    match value {
        Value::String(s) if s.contains("$$") => *s = s.replace("$$", "$"),
        Value::Object(t) => t.values_mut().for_each(unescape_value),
        Value::Array(arr) => arr.iter_mut().for_each(unescape_value),
        _ => {}
    }
}

/// Consumes characters until the delimiter, returning the collected string.
fn consume_until(chars: &mut std::iter::Peekable<std::str::Chars>, delim: char) -> Option<String> {
    let mut result = String::new();
    for ch in chars.by_ref() {
        if ch == delim {
            return Some(result);
        }
        result.push(ch);
    }
    None
}

/// Looks up a dotted path in the tree and returns the value as a string.
fn lookup_path(root: &Map<String, Value>, path: &str) -> Result<String, ConfigError> {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(ConfigError::InvalidReferencePath(path.to_string()));
    }

    let not_found = || ConfigError::ReferenceNotFound(path.to_string());

    let mut current = root.get(parts[0]).ok_or_else(not_found)?;
    for part in &parts[1..] {
        current = current
            .as_object()
            .and_then(|t| t.get(*part))
            .ok_or_else(not_found)?;
    }

    value_to_string(current, path)
}

fn value_to_string(value: &Value, path: &str) -> Result<String, ConfigError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Err(ConfigError::ReferenceNotFound(path.to_string())),
        Value::Array(_) | Value::Object(_) => {
            Err(ConfigError::NonScalarReference(path.to_string()))
        }
    }
}
