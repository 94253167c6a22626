use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use super::env::EnvSource;
use super::file::FileSource;
use super::resolve::resolve_references;
use super::source::{merge_at_path, ConfigSource};
use super::ConfigError;

/// Builder for loading configuration from files and the environment.
///
/// Sources are merged in registration order, with later sources overriding
/// earlier ones. Nested tables are merged recursively; other values
/// (including arrays) are replaced entirely.
///
/// ## Variable References
///
/// String values can reference other config values using `${path.to.field}` syntax:
///
/// ```toml
/// [server]
/// host = "localhost"
/// port = 8080
/// url = "http://${server.host}:${server.port}/api"
/// ```
///
/// Use `$$` to escape a literal `$` (e.g., `$${VAR}` becomes `${VAR}`).
///
/// `{{ ... }}` template actions are left in place; fields declared as
/// [`Optional<T>`](crate::Optional) evaluate them while deserializing.
///
/// ## Example
///
/// ```no_run
/// use serde::Deserialize;
/// use tmplcfg::{Config, Optional};
///
/// #[derive(Deserialize)]
/// struct MyConfig {
///     name: String,
///     #[serde(default)]
///     port: Optional<u16>,
/// }
///
/// let config: MyConfig = Config::builder()
///     .with_file("config/default.toml", true)
///     .with_file("config/local.yaml", false)
///     .build()?;
/// # Ok::<(), tmplcfg::ConfigError>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct Config {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl Config {
    /// Creates a new configuration builder.
    pub fn builder() -> Self {
        Self::default()
    }

    /// Adds a TOML, YAML or JSON file to be loaded, chosen by extension.
    ///
    /// If `required` is `true`, the build will fail if the file doesn't exist.
    /// Optional files that are missing are silently skipped.
    pub fn with_file(self, path: impl AsRef<Path>, required: bool) -> Self {
        self.with_source(FileSource::new(path, required))
    }

    /// Loads configuration from environment variables with the given prefix.
    ///
    /// Environment variables are mapped to config paths by:
    /// 1. Removing the prefix and separator
    /// 2. Splitting remaining segments on the separator
    /// 3. Converting path segments to lowercase
    ///
    /// Values are coerced from strings to an integer, float or boolean when
    /// the coerced value prints back as the same text (`5432`, `0.5`, `true`).
    /// Anything else, including `007`, `1.10` and `TRUE`, stays a string so an
    /// `Optional<String>` field sees the variable verbatim.
    ///
    /// ```no_run
    /// # use tmplcfg::Config;
    /// # use serde::Deserialize;
    /// # #[derive(Deserialize)] struct MyConfig { }
    /// // With MYAPP__DATABASE__PORT=5432 set:
    /// // defaults -> env overrides -> local file overrides env
    /// let config: MyConfig = Config::builder()
    ///     .with_file("config/default.toml", true)
    ///     .with_env("MYAPP", "__")
    ///     .with_file("config/local.toml", false)
    ///     .build()?;
    /// # Ok::<(), tmplcfg::ConfigError>(())
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `separator` is empty.
    pub fn with_env(self, prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        self.with_source(EnvSource::new(prefix, separator))
    }

    /// Adds a custom source.
    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Loads, merges and resolves all sources into a raw tree.
    pub fn build_raw(self) -> Result<Map<String, Value>, ConfigError> {
        debug!(sources = self.sources.len(), "merging configuration sources");
        let mut merged = Map::new();

        for source in &self.sources {
            for entry in source.entries()? {
                merge_at_path(&mut merged, &entry.path, entry.value);
            }
        }

        // Resolve ${...} references after all sources are merged
        resolve_references(&mut merged)?;
        Ok(merged)
    }

    /// Builds the configuration by loading, merging, resolving, and deserializing.
    pub fn build<T: DeserializeOwned>(self) -> Result<T, ConfigError> {
        let merged = self.build_raw()?;
        serde_json::from_value(Value::Object(merged)).map_err(ConfigError::DeserializeError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::source::ConfigEntry;
    use crate::Optional;
    use serde::Deserialize;
    use serde_json::json;
    use std::io::Write;
    use tempfile::Builder;

    #[derive(Debug)]
    struct Fixed(Vec<ConfigEntry>);

    impl ConfigSource for Fixed {
        fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
            Ok(self.0.clone())
        }
    }

    #[derive(Debug, Deserialize)]
    struct Settings {
        server: Server,
    }

    #[derive(Debug, Deserialize)]
    struct Server {
        host: String,
        #[serde(default)]
        port: Optional<u16>,
        #[serde(default)]
        workers: Optional<u8>,
    }

    #[test]
    fn test_later_sources_override() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[server]\nhost = \"a\"\nport = 80").unwrap();

        let settings: Settings = Config::builder()
            .with_file(file.path(), true)
            .with_source(Fixed(vec![ConfigEntry::at_path(
                vec!["server".into(), "port".into()],
                json!("{{ \"8080\" }}"),
            )]))
            .build()
            .unwrap();

        assert_eq!(settings.server.host, "a");
        assert_eq!(settings.server.port, Optional::Present(8080));
        assert!(settings.server.workers.is_absent());
    }

    #[test]
    fn test_build_raw_resolves_references() {
        let raw = Config::builder()
            .with_source(Fixed(vec![ConfigEntry::at_path(
                vec![],
                json!({ "host": "db", "url": "postgres://${host}" }),
            )]))
            .build_raw()
            .unwrap();
        assert_eq!(raw["url"], "postgres://db");
    }

    #[test]
    fn test_deserialize_error() {
        let result: Result<Settings, _> = Config::builder().build();
        assert!(matches!(result, Err(ConfigError::DeserializeError(_))));
    }

    #[test]
    fn test_missing_required_file() {
        let result = Config::builder()
            .with_file("/nonexistent/config.toml", true)
            .build_raw();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
