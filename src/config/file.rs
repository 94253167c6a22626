//! File-based configuration source.

use std::path::{Path, PathBuf};

use serde_json::{Map, Number, Value};
use tracing::debug;

use super::source::{ConfigEntry, ConfigSource};
use super::ConfigError;

/// Supported configuration file formats, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Yaml,
    Json,
}

impl Format {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// A configuration source that loads from a TOML, YAML or JSON file.
///
/// Files can be marked as required or optional. Required files that don't exist
/// cause an error; optional files that don't exist are silently skipped.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    required: bool,
}

impl FileSource {
    /// Creates a new file source.
    ///
    /// If `required` is true, the build will fail if the file doesn't exist.
    pub fn new(path: impl AsRef<Path>, required: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            required,
        }
    }
}

impl ConfigSource for FileSource {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        match load_config_file(&self.path, self.required)? {
            Some(table) => Ok(vec![ConfigEntry::root(table)]),
            None => Ok(vec![]),
        }
    }
}

/// Loads and parses a config file.
///
/// Returns `Ok(None)` if the file doesn't exist and `required` is false.
fn load_config_file(
    path: &Path,
    required: bool,
) -> Result<Option<Map<String, Value>>, ConfigError> {
    let format =
        Format::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;

    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let table = parse_contents(&contents, format, path)?;
            debug!(path = %path.display(), ?format, keys = table.len(), "loaded config file");
            Ok(Some(table))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if required {
                Err(ConfigError::FileNotFound(path.to_path_buf()))
            } else {
                debug!(path = %path.display(), "optional config file not found, skipping");
                Ok(None)
            }
        }
        Err(e) => Err(ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn parse_contents(
    contents: &str,
    format: Format,
    path: &Path,
) -> Result<Map<String, Value>, ConfigError> {
    let value = match format {
        Format::Toml => {
            let table: toml::Table = toml::from_str(contents).map_err(|e| ConfigError::TomlError {
                path: path.to_path_buf(),
                source: e,
            })?;
            toml_to_raw(toml::Value::Table(table))
        }
        Format::Yaml => {
            let value: serde_yaml::Value =
                serde_yaml::from_str(contents).map_err(|e| ConfigError::YamlError {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            yaml_to_raw(value).ok_or_else(|| ConfigError::NonScalarKey(path.to_path_buf()))?
        }
        Format::Json => serde_json::from_str(contents).map_err(|e| ConfigError::JsonError {
            path: path.to_path_buf(),
            source: e,
        })?,
    };

    match value {
        Value::Object(table) => Ok(table),
        // An empty YAML document
        Value::Null => Ok(Map::new()),
        _ => Err(ConfigError::NotATable(path.to_path_buf())),
    }
}

/// Converts a TOML value into a raw node.
///
/// Datetimes become their RFC 3339 text and non-finite floats their textual
/// form, since neither has a JSON counterpart.
fn toml_to_raw(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => {
            Number::from_f64(f).map_or_else(|| Value::String(f.to_string()), Value::Number)
        }
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_raw).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_raw(value)))
                .collect(),
        ),
    }
}

/// Converts a YAML value into a raw node.
///
/// Scalar mapping keys (`80: web`, `true: on`) become their text. Tags are
/// dropped. Returns `None` if a mapping key is a sequence or mapping.
fn yaml_to_raw(value: serde_yaml::Value) -> Option<Value> {
    use serde_yaml::Value as Yaml;

    Some(match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => yaml_number(&n),
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_raw).collect::<Option<_>>()?)
        }
        Yaml::Mapping(mapping) => {
            let mut table = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                table.insert(yaml_key(key)?, yaml_to_raw(value)?);
            }
            Value::Object(table)
        }
        Yaml::Tagged(tagged) => yaml_to_raw(tagged.value)?,
    })
}

fn yaml_number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::from(i)
    } else if let Some(u) = n.as_u64() {
        Value::from(u)
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map_or_else(|| Value::String(n.to_string()), Value::Number)
    }
}

fn yaml_key(key: serde_yaml::Value) -> Option<String> {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => Some(s),
        Yaml::Number(n) => Some(n.to_string()),
        Yaml::Bool(b) => Some(b.to_string()),
        Yaml::Null => Some("null".to_string()),
        Yaml::Tagged(tagged) => yaml_key(tagged.value),
        Yaml::Sequence(_) | Yaml::Mapping(_) => None,
    }
}
