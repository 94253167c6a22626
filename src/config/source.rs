use serde_json::{Map, Value};

use super::ConfigError;

/// A value to merge into the configuration tree at `path`.
///
/// An empty path merges a table into the root.
#[derive(Debug, Clone)]
pub struct ConfigEntry {
    pub path: Vec<String>,
    pub value: Value,
}

impl ConfigEntry {
    pub fn root(table: Map<String, Value>) -> Self {
        Self {
            path: Vec::new(),
            value: Value::Object(table),
        }
    }

    pub fn at_path(path: Vec<String>, value: Value) -> Self {
        Self { path, value }
    }
}

/// A producer of configuration entries (files, environment, ...).
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError>;
}

pub fn merge_at_path(table: &mut Map<String, Value>, path: &[String], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        if let Value::Object(overlay) = value {
            deep_merge(table, overlay);
        }
        return;
    };

    if rest.is_empty() {
        match (table.get_mut(first), value) {
            (Some(Value::Object(base)), Value::Object(overlay)) => {
                deep_merge(base, overlay);
            }
            (_, value) => {
                table.insert(first.clone(), value);
            }
        }
        return;
    }

    if !matches!(table.get(first), Some(Value::Object(_))) {
        table.insert(first.clone(), Value::Object(Map::new()));
    }

    if let Some(Value::Object(nested)) = table.get_mut(first) {
        merge_at_path(nested, rest, value);
    }
}

fn deep_merge(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Object(base_table)), Value::Object(overlay_table)) => {
                deep_merge(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn table(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_root_merge_is_deep() {
        let mut base = table(json!({ "server": { "host": "a", "port": 1 }, "tags": [1] }));
        merge_at_path(
            &mut base,
            &[],
            json!({ "server": { "port": 2 }, "tags": [2, 3] }),
        );
        assert_eq!(
            Value::Object(base),
            json!({ "server": { "host": "a", "port": 2 }, "tags": [2, 3] })
        );
    }

    #[test]
    fn test_nested_path_creates_tables() {
        let mut base = Map::new();
        merge_at_path(
            &mut base,
            &["database".to_string(), "port".to_string()],
            json!(5432),
        );
        assert_eq!(Value::Object(base), json!({ "database": { "port": 5432 } }));
    }

    #[test]
    fn test_scalar_replaced_by_nested_path() {
        let mut base = table(json!({ "database": "sqlite" }));
        merge_at_path(
            &mut base,
            &["database".to_string(), "host".to_string()],
            json!("localhost"),
        );
        assert_eq!(
            Value::Object(base),
            json!({ "database": { "host": "localhost" } })
        );
    }
}
