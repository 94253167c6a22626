//! Log subscriber bootstrap.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogConfig {
    /// Human-readable output at debug level instead of JSON lines at info.
    pub development: bool,
    /// Include the source file and line of each event.
    pub show_caller: bool,
}

impl LogConfig {
    fn to_filter(self) -> String {
        let level = if self.development { "debug" } else { "info" };
        format!("tmplcfg={level}")
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn boot_logger(config: &LogConfig) -> Result<(), Error> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.to_filter()));
    let registry = tracing_subscriber::registry().with(filter);

    if config.development {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_file(config.show_caller)
                    .with_line_number(config.show_caller)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(config.show_caller)
                    .with_line_number(config.show_caller)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    Ok(())
}
