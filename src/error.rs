use crate::config::ConfigError;
use crate::option::DecodeError;
use crate::template::TemplateError;
use thiserror::Error;

/// Top-level error type for the tmplcfg library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("failed to install log subscriber: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),
}
