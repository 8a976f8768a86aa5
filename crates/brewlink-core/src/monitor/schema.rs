//! Monitor profile: the per-model layout of the telemetry buffer.
//!
//! A profile is an ordered list of [`FieldDescriptor`]s, each naming a byte
//! range and how to interpret it.  Profiles come from device maps, e.g.:
//!
//! ```json
//! "monitor_profile": [
//!   { "name": "status",      "offset": 0, "width": 1, "kind": "enum",
//!     "enum_table": { "0": "standby", "7": "ready" } },
//!   { "name": "alarms",      "offset": 1, "width": 2, "kind": "bitfield" },
//!   { "name": "boiler_temp", "offset": 3, "width": 2, "kind": "signed-int",
//!     "endianness": "little", "scale": 0.1 }
//! ]
//! ```
//!
//! Offsets are never checked against a buffer here; the same profile is
//! reused for payloads of every length and the decoder deals with short ones.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// How the bytes of a field are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    #[default]
    #[serde(alias = "unsigned", alias = "uint")]
    UnsignedInt,
    #[serde(alias = "signed", alias = "int")]
    SignedInt,
    #[serde(alias = "bits", alias = "flags")]
    Bitfield,
    Enum,
    #[serde(alias = "bytes", alias = "raw")]
    RawBytes,
}

impl FieldKind {
    /// `true` for kinds that decode the bytes as an integer first.
    pub fn is_integer(self) -> bool {
        !matches!(self, FieldKind::RawBytes)
    }

    /// The name used for this kind in device maps.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::UnsignedInt => "unsigned-int",
            FieldKind::SignedInt => "signed-int",
            FieldKind::Bitfield => "bitfield",
            FieldKind::Enum => "enum",
            FieldKind::RawBytes => "raw-bytes",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Byte order of multi-byte integer fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    #[default]
    #[serde(alias = "be", alias = "big-endian")]
    Big,
    #[serde(alias = "le", alias = "little-endian")]
    Little,
}

impl Endianness {
    pub fn as_str(self) -> &'static str {
        match self {
            Endianness::Big => "big",
            Endianness::Little => "little",
        }
    }
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named field of the telemetry buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    /// Byte offset from the start of the decoded buffer.
    pub offset: usize,
    /// Field width in bytes.  Integer kinds support 1 to 8.
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default)]
    pub kind: FieldKind,
    /// Multiplier applied to signed/unsigned integers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(default)]
    pub endianness: Endianness,
    /// Labels for `enum` fields, keyed by raw code.
    #[serde(
        default,
        alias = "enum-table",
        alias = "enum_map",
        deserialize_with = "deserialize_enum_table",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub enum_table: BTreeMap<u64, String>,
}

fn default_width() -> usize {
    1
}

impl FieldDescriptor {
    /// Creates a big-endian, unscaled descriptor.
    pub fn new(name: impl Into<String>, offset: usize, width: usize, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            offset,
            width,
            kind,
            scale: None,
            endianness: Endianness::Big,
            enum_table: BTreeMap::new(),
        }
    }

    /// Sets the scale multiplier.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Sets the byte order.
    pub fn with_endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self
    }

    /// Adds an enum label.
    pub fn with_label(mut self, code: u64, label: impl Into<String>) -> Self {
        self.enum_table.insert(code, label.into());
        self
    }

    /// Index one past the last byte, or `None` if it overflows `usize`.
    pub fn end(&self) -> Option<usize> {
        self.offset.checked_add(self.width)
    }
}

/// Enum tables arrive with string keys (JSON object keys always are).
/// Decimal and `0x`-prefixed hex keys are accepted; anything else is dropped.
fn deserialize_enum_table<'de, D>(deserializer: D) -> Result<BTreeMap<u64, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, String>>::deserialize(deserializer)?.unwrap_or_default();
    let mut table = BTreeMap::new();
    for (key, label) in raw {
        match parse_code(&key) {
            Some(code) => {
                table.insert(code, label);
            }
            None => warn!("ignoring enum label '{label}' with non-numeric code '{key}'"),
        }
    }
    Ok(table)
}

fn parse_code(key: &str) -> Option<u64> {
    let key = key.trim();
    match key.strip_prefix("0x").or_else(|| key.strip_prefix("0X")) {
        Some(hex_digits) => u64::from_str_radix(hex_digits, 16).ok(),
        None => key.parse().ok(),
    }
}

/// Ordered, immutable collection of field descriptors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSchema {
    fields: Vec<FieldDescriptor>,
}

impl FieldSchema {
    /// Builds a schema from already-validated descriptors.
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }

    /// Builds a schema from the `monitor_profile` section of a device map.
    ///
    /// Accepts either a list of descriptors or an object with a `fields`
    /// list.  Anything else (including `null`) yields an empty schema.
    /// Individual descriptors that fail to parse, have zero width, or reuse
    /// an earlier name are skipped with a warning.
    pub fn from_config(raw: &Value) -> Self {
        let items: &[Value] = match raw {
            Value::Array(items) => items.as_slice(),
            Value::Object(map) => match map.get("fields") {
                Some(Value::Array(items)) => items.as_slice(),
                _ => &[],
            },
            Value::Null => &[],
            other => {
                warn!("monitor profile must be a list of fields, got {other}; using empty profile");
                &[]
            }
        };

        let mut fields: Vec<FieldDescriptor> = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let descriptor = match FieldDescriptor::deserialize(item) {
                Ok(d) => d,
                Err(e) => {
                    warn!("skipping monitor field #{index}: {e}");
                    continue;
                }
            };
            if descriptor.width == 0 {
                warn!("skipping monitor field '{}': width must be positive", descriptor.name);
                continue;
            }
            if fields.iter().any(|f| f.name == descriptor.name) {
                warn!("skipping duplicate monitor field '{}'", descriptor.name);
                continue;
            }
            fields.push(descriptor);
        }

        Self { fields }
    }

    /// Descriptors in profile order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Looks up a descriptor by exact name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in profile order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Buffer length needed for every field to decode.
    pub fn required_len(&self) -> usize {
        self.fields
            .iter()
            .map(|f| f.end().unwrap_or(usize::MAX))
            .max()
            .unwrap_or(0)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
