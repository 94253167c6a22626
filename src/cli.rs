//! Command-line surface of the `tmplcfg` binary.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::Config;
use crate::logging::LogConfig;
use crate::option::{decode_field, ConfigValue, DecodeError, RawNode};
use crate::Error;

#[derive(Debug, Parser)]
#[command(
    name = "tmplcfg",
    version,
    about = "Load layered configuration and decode templated optional values"
)]
pub struct Args {
    /// Config file to load (TOML, YAML or JSON). Repeat to layer files; later ones win.
    #[arg(short, long = "config", value_name = "FILE")]
    pub config: Vec<PathBuf>,

    /// Read overrides from environment variables starting with this prefix.
    #[arg(long, value_name = "PREFIX")]
    pub env_prefix: Option<String>,

    /// Separator between prefix and path segments in environment variable names.
    #[arg(long, value_name = "SEP", default_value = "__")]
    pub env_separator: String,

    /// Decode and print only the value at this dotted path.
    #[arg(long, value_name = "PATH")]
    pub get: Option<String>,

    /// Type to decode `--get` as.
    #[arg(long = "as", value_enum, default_value_t = ValueKind::Json)]
    pub kind: ValueKind,

    /// Enable verbose development logger instead of JSON.
    #[arg(long)]
    pub dev_logging: bool,

    /// Include caller file and line in log output.
    #[arg(long)]
    pub log_caller_info: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ValueKind {
    String,
    Int,
    Float,
    Bool,
    Json,
}

impl Args {
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            development: self.dev_logging,
            show_caller: self.log_caller_info,
        }
    }

    fn config_builder(&self) -> Config {
        let mut builder = Config::builder();
        for path in &self.config {
            builder = builder.with_file(path, true);
        }
        if let Some(prefix) = &self.env_prefix {
            builder = builder.with_env(prefix.as_str(), self.env_separator.as_str());
        }
        builder
    }

    /// Loads the configuration and returns what should be printed.
    pub fn run(&self) -> Result<Value, Error> {
        let tree = Value::Object(self.config_builder().build_raw()?);
        info!(files = self.config.len(), "configuration loaded");

        let Some(path) = &self.get else {
            return Ok(tree);
        };

        debug!(path = %path, kind = ?self.kind, "decoding field");
        let value = match self.kind {
            ValueKind::String => present::<String>(&tree, path)?,
            ValueKind::Int => present::<i64>(&tree, path)?,
            ValueKind::Float => present::<f64>(&tree, path)?,
            ValueKind::Bool => present::<bool>(&tree, path)?,
            ValueKind::Json => present::<Value>(&tree, path)?,
        };
        Ok(value)
    }
}

/// Decodes the field at `path`, rendering an absent value as `null`.
fn present<T>(tree: &RawNode, path: &str) -> Result<Value, DecodeError>
where
    T: ConfigValue + Into<Value>,
{
    Ok(decode_field::<T>(tree, path)?
        .map(Into::into)
        .unwrap_or(Value::Null))
}
