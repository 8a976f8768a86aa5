//! Subcommand handlers.
//!
//! Each handler takes a parsed device map and returns the text to print.
//! Nothing here touches a device: `encode` prints the payload a transport
//! would send, and `decode` reads a blob captured elsewhere.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use brewlink_core::command::{CommandCodec, CommandError, TimestampFormat};
use brewlink_core::monitor::{decode_monitor, DecodeError};
use brewlink_core::DeviceSchema;
use serde_json::{Map, Value};
use thiserror::Error;

/// Error type for subcommand handlers.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// `brewlink commands`: one `alias<TAB>hex` line per command.
pub fn list_commands(schema: &DeviceSchema) -> String {
    schema
        .alias_resolver()
        .command_map()
        .iter()
        .map(|(alias, descriptor)| format!("{alias}\t{}\n", descriptor.raw))
        .collect()
}

/// `brewlink properties`: one `alias<TAB>raw key` line per property.
pub fn list_properties(schema: &DeviceSchema) -> String {
    schema
        .property_map
        .iter()
        .map(|(alias, raw_key)| format!("{alias}\t{raw_key}\n"))
        .collect()
}

/// `brewlink fields`: the monitor profile as a table, in profile order.
pub fn list_fields(schema: &DeviceSchema) -> String {
    let mut out = String::from("name\toffset\twidth\tkind\tendianness\tscale\n");
    for f in schema.monitor_profile.fields() {
        let scale = f.scale.map_or_else(|| "-".to_string(), |s| s.to_string());
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\t{scale}\n",
            f.name, f.offset, f.width, f.kind, f.endianness
        ));
    }
    out
}

/// `brewlink encode <alias>`: the base64 payload for a command.
///
/// `at` pins the timestamp (Unix seconds); `fixed_width` switches to a
/// fixed-width timestamp of that many bytes.
///
/// # Errors
///
/// [`CommandError::UnknownCommand`] if the alias is missing or has an empty
/// command string, [`CommandError::InvalidCommandEncoding`] for bad hex.
pub fn encode(
    schema: &DeviceSchema,
    alias: &str,
    at: Option<u64>,
    fixed_width: Option<u8>,
) -> Result<String, CliError> {
    let codec = match fixed_width {
        Some(width) => CommandCodec::new(TimestampFormat::FixedWidth(width)),
        None => CommandCodec::default(),
    };
    let now = match at {
        Some(secs) => UNIX_EPOCH + Duration::from_secs(secs),
        None => SystemTime::now(),
    };
    Ok(codec.encode_alias(&schema.alias_resolver(), alias, now)?)
}

/// `brewlink resolve <alias>`: the raw property key for an alias.
pub fn resolve(schema: &DeviceSchema, alias: &str) -> String {
    schema.alias_resolver().resolve_property(alias).to_string()
}

/// `brewlink decode <b64>`: the decoded frame as pretty JSON.
///
/// Fields that do not fit the blob are absent from the output.
///
/// # Errors
///
/// [`DecodeError::MalformedEncoding`] if the blob is not valid base64.
pub fn decode(schema: &DeviceSchema, raw_b64: &str) -> Result<String, CliError> {
    let frame = decode_monitor(raw_b64, &schema.monitor_profile)?;
    let mut fields = Map::new();
    for field in frame.iter() {
        fields.insert(field.name.clone(), serde_json::to_value(&field.value)?);
    }
    Ok(serde_json::to_string_pretty(&Value::Object(fields))?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
