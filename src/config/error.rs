use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("required config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML config file '{path}': {source}")]
    TomlError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to parse YAML config file '{path}': {source}")]
    YamlError {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("failed to parse JSON config file '{path}': {source}")]
    JsonError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("unsupported config file format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("config file '{0}' must contain a table at the top level")]
    NotATable(PathBuf),

    #[error("config file '{0}' has a mapping key that is not a scalar")]
    NonScalarKey(PathBuf),

    #[error("failed to deserialize config: {0}")]
    DeserializeError(#[from] serde_json::Error),

    #[error("circular reference detected in configuration")]
    CircularReference,

    #[error("referenced path not found: {0}")]
    ReferenceNotFound(String),

    #[error("invalid reference path: {0}")]
    InvalidReferencePath(String),

    #[error("cannot reference non-scalar value: {0}")]
    NonScalarReference(String),

    #[error("unclosed reference (missing '}}')")]
    UnclosedReference,
}
