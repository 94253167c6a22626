use serde_json::{Number, Value};
use tracing::trace;

use super::source::{ConfigEntry, ConfigSource};
use super::ConfigError;

/// Configuration overrides taken from `PREFIX<sep>SECTION<sep>KEY` variables.
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    separator: String,
}

impl EnvSource {
    /// # Panics
    ///
    /// Panics if `separator` is empty.
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        assert!(!separator.is_empty(), "separator must not be empty");
        Self {
            prefix: prefix.into(),
            separator,
        }
    }

    fn entries_from(&self, vars: impl IntoIterator<Item = (String, String)>) -> Vec<ConfigEntry> {
        let prefix_with_sep = format!("{}{}", self.prefix, self.separator);
        let mut entries = Vec::new();

        for (key, value) in vars {
            if let Some(path_str) = key.strip_prefix(&prefix_with_sep) {
                if path_str.is_empty() {
                    continue;
                }

                let path: Vec<String> = path_str
                    .split(&self.separator)
                    .map(|s| s.to_lowercase())
                    .collect();

                trace!(key = %key, path = %path.join("."), "applying environment override");
                entries.push(ConfigEntry::at_path(path, coerce_value(&value)));
            }
        }

        entries
    }
}

impl ConfigSource for EnvSource {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        Ok(self.entries_from(std::env::vars()))
    }
}

/// Coerces a variable to a bool or number only when that value renders back
/// to exactly the same text, so `007` or `1.10` stay strings.
fn coerce_value(s: &str) -> Value {
    let coerced = match s {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        _ if looks_like_integer(s) => s.parse::<i64>().ok().map(Value::from),
        _ if s.contains('.') => s
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        _ => None,
    };

    match coerced {
        Some(value) if value.to_string() == s => value,
        _ => Value::String(s.to_string()),
    }
}

fn looks_like_integer(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}
