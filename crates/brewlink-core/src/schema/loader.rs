//! Reading device maps from disk.
//!
//! Files ending in `.toml` are parsed as TOML; everything else as JSON.  A
//! device map that does not exist loads as an empty schema, so a device
//! without a map still works for raw commands and raw property keys.

use std::path::Path;

use tracing::{debug, warn};

use super::{DeviceSchema, SchemaError};

/// Loads the device map at `path`.
///
/// # Errors
///
/// Returns [`SchemaError::Io`] for file-system errors other than "not found",
/// and [`SchemaError::Json`] / [`SchemaError::Toml`] if the document cannot
/// be parsed.
pub fn load_device_schema(path: &Path) -> Result<DeviceSchema, SchemaError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("device map {} not found; using an empty schema", path.display());
            return Ok(DeviceSchema::default());
        }
        Err(source) => {
            return Err(SchemaError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let schema = if is_toml(path) {
        DeviceSchema::from_toml_str(&text)?
    } else {
        DeviceSchema::from_json_str(&text)?
    };
    debug!(
        "loaded device map {}: {} commands, {} properties, {} monitor fields",
        path.display(),
        schema.command_map.len(),
        schema.property_map.len(),
        schema.monitor_profile.len()
    );
    Ok(schema)
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
