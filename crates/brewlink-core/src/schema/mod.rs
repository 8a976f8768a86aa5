//! Device maps: the per-model command, property and monitor tables.
//!
//! A device map is a JSON (or TOML) document:
//!
//! ```json
//! {
//!   "command_map":     { "espresso": { "command": "0d07" } },
//!   "property_map":    { "water_temp": "d302_temp" },
//!   "monitor_profile": [ { "name": "status", "offset": 0, "kind": "enum" } ]
//! }
//! ```
//!
//! Every section is optional.  A missing or malformed section becomes an
//! empty table and the rest of the map still loads; only a document that
//! cannot be parsed at all is an error.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::alias::{AliasResolver, CommandDescriptor};
use crate::monitor::schema::FieldSchema;

pub mod loader;
pub mod registry;

pub use loader::load_device_schema;
pub use registry::ModelRegistry;

/// Error type for device map loading.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A file system I/O error occurred.
    #[error("I/O error reading device map at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The JSON document could not be parsed.
    #[error("failed to parse device map JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The TOML document could not be parsed.
    #[error("failed to parse device map TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// No device map is registered for the model.
    #[error("no device map registered for model '{0}'")]
    UnknownModel(String),
}

/// Parsed device map for one model.  Immutable once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceSchema {
    pub command_map: BTreeMap<String, CommandDescriptor>,
    pub property_map: BTreeMap<String, String>,
    pub monitor_profile: FieldSchema,
}

impl DeviceSchema {
    /// Builds a schema from a parsed document, tolerating bad sections.
    pub fn from_value(doc: &Value) -> Self {
        let Value::Object(root) = doc else {
            warn!("device map root is not an object; using an empty schema");
            return Self::default();
        };

        let profile = root.get("monitor_profile").unwrap_or(&Value::Null);
        Self {
            command_map: parse_command_map(root.get("command_map")),
            property_map: parse_property_map(root.get("property_map")),
            monitor_profile: FieldSchema::from_config(profile),
        }
    }

    /// Parses a JSON device map.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Json`] if `text` is not valid JSON.
    pub fn from_json_str(text: &str) -> Result<Self, SchemaError> {
        let doc: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(&doc))
    }

    /// Parses a TOML device map.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Toml`] if `text` is not valid TOML.
    pub fn from_toml_str(text: &str) -> Result<Self, SchemaError> {
        let doc: Value = toml::from_str(text)?;
        Ok(Self::from_value(&doc))
    }

    /// Builds the alias tables for this map.
    pub fn alias_resolver(&self) -> AliasResolver {
        AliasResolver::new(self.command_map.clone(), self.property_map.clone())
    }
}

fn parse_command_map(section: Option<&Value>) -> BTreeMap<String, CommandDescriptor> {
    let mut out = BTreeMap::new();
    let Some(section) = section else {
        return out;
    };
    let Value::Object(entries) = section else {
        warn!("command_map must be an object; ignoring it");
        return out;
    };

    for (alias, entry) in entries {
        let raw = match entry {
            Value::String(raw) => Some(raw.clone()),
            Value::Object(fields) => fields
                .get("command")
                .or_else(|| fields.get("raw"))
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        };
        match raw {
            Some(raw) => {
                out.insert(alias.clone(), CommandDescriptor::new(raw));
            }
            None => warn!("command '{alias}' has no hex command string; ignoring it"),
        }
    }
    out
}

fn parse_property_map(section: Option<&Value>) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    let Some(section) = section else {
        return out;
    };
    let Value::Object(entries) = section else {
        warn!("property_map must be an object; ignoring it");
        return out;
    };

    for (alias, raw) in entries {
        match raw.as_str() {
            Some(raw) => {
                out.insert(alias.clone(), raw.to_string());
            }
            None => warn!("property '{alias}' does not map to a string key; ignoring it"),
        }
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_reads_all_sections() {
        // Arrange
        let doc = json!({
            "command_map": { "latte": { "command": "a1" }, "Espresso": "0d07" },
            "property_map": { "temp": "T1" },
            "monitor_profile": [{ "name": "status", "offset": 0 }],
        });

        // Act
        let schema = DeviceSchema::from_value(&doc);

        // Assert
        assert_eq!(schema.command_map.get("latte"), Some(&CommandDescriptor::new("a1")));
        assert_eq!(schema.command_map.get("Espresso"), Some(&CommandDescriptor::new("0d07")));
        assert_eq!(schema.property_map.get("temp").map(String::as_str), Some("T1"));
        assert_eq!(schema.monitor_profile.len(), 1);
    }

    #[test]
    fn test_missing_sections_are_empty() {
        let schema = DeviceSchema::from_value(&json!({}));
        assert_eq!(schema, DeviceSchema::default());
    }

    #[test]
    fn test_malformed_sections_degrade_independently() {
        let schema = DeviceSchema::from_value(&json!({
            "command_map": ["not", "an", "object"],
            "property_map": { "temp": "T1", "bad": 7 },
            "monitor_profile": 42,
        }));
        assert!(schema.command_map.is_empty());
        assert_eq!(schema.property_map.len(), 1);
        assert!(schema.monitor_profile.is_empty());
    }

    #[test]
    fn test_command_entries_without_hex_are_skipped() {
        let schema = DeviceSchema::from_value(&json!({
            "command_map": { "a": { "name": "no hex" }, "b": { "raw": "ff" }, "c": 5 }
        }));
        assert_eq!(schema.command_map.len(), 1);
        assert_eq!(schema.command_map.get("b"), Some(&CommandDescriptor::new("ff")));
    }

    #[test]
    fn test_non_object_root_is_empty_schema() {
        assert_eq!(DeviceSchema::from_value(&json!([1, 2])), DeviceSchema::default());
    }

    #[test]
    fn test_from_json_str_rejects_broken_json() {
        assert!(matches!(DeviceSchema::from_json_str("{ nope"), Err(SchemaError::Json(_))));
    }

    #[test]
    fn test_from_toml_str_reads_same_structure() {
        let toml_str = r#"
[command_map.espresso]
command = "0d07"

[property_map]
temp = "T1"

[[monitor_profile]]
name = "status"
offset = 0
kind = "enum"
enum_table = { "7" = "ready" }
"#;
        let schema = DeviceSchema::from_toml_str(toml_str).expect("valid toml");
        assert_eq!(schema.command_map.get("espresso"), Some(&CommandDescriptor::new("0d07")));
        assert_eq!(schema.property_map.get("temp").map(String::as_str), Some("T1"));
        let status = schema.monitor_profile.field("status").unwrap();
        assert_eq!(status.enum_table.get(&7).map(String::as_str), Some("ready"));
    }

    #[test]
    fn test_alias_resolver_uses_normalised_command_keys() {
        let schema = DeviceSchema::from_value(&json!({ "command_map": { "Latte": "a1" } }));
        let resolver = schema.alias_resolver();
        assert_eq!(resolver.resolve_command("LATTE"), Some(&CommandDescriptor::new("a1")));
    }
}
