//! Device facade: one appliance, its device map, and its transport.
//!
//! ```text
//! DeviceSchema ──► AliasResolver ──► CommandCodec ──► transport.send_wire_payload
//!              └─► FieldSchema   ◄── MonitorView  ◄── transport.read_raw_telemetry
//! ```
//!
//! The facade owns no mutable state of its own.  Every read goes to the
//! transport, so a [`MonitorView`] obtained from [`Device::monitor`] always
//! reflects the latest telemetry.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::alias::AliasResolver;
use crate::command::{CommandCodec, CommandError};
use crate::monitor::{
    decode_monitor, DecodeError, DecodedFrame, FieldSchema, MonitorView, TelemetrySource,
};
use crate::schema::{DeviceSchema, ModelRegistry, SchemaError};
use crate::transport::{DeviceTransport, MonitorSnapshot, TransportError};

/// Error type for device operations.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Descriptive metadata about a device.  Not used by the protocol layer.
///
/// Deserialises from the device records returned by discovery or cloud
/// listings; keys this struct does not name are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device serial number as assigned by the vendor cloud; the primary
    /// identifier of a physical appliance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dsn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware: Option<String>,
    /// LAN address, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A device bound to its device map and transport.
pub struct Device<T> {
    transport: T,
    info: DeviceInfo,
    aliases: AliasResolver,
    monitor_profile: FieldSchema,
    codec: CommandCodec,
}

impl<T: DeviceTransport> Device<T> {
    /// Builds a device from a parsed device map.
    ///
    /// If the transport reports that it accepts alias tables, they are handed
    /// over here; a transport without that capability is never asked.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Transport`] if a capable transport rejects the
    /// alias tables.
    pub fn from_schema(transport: T, schema: DeviceSchema) -> Result<Self, DeviceError> {
        let aliases = AliasResolver::new(schema.command_map, schema.property_map);
        if transport.supports_mappings() {
            transport.set_mappings(aliases.command_map(), aliases.property_map())?;
        }
        info!(
            "device ready: {} commands, {} properties, {} monitor fields",
            aliases.command_map().len(),
            aliases.property_map().len(),
            schema.monitor_profile.len()
        );
        Ok(Self {
            transport,
            info: DeviceInfo::default(),
            aliases,
            monitor_profile: schema.monitor_profile,
            codec: CommandCodec::default(),
        })
    }

    /// Loads the device map registered for `model` and builds the device.
    ///
    /// The model name is recorded in [`DeviceInfo::model`].
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Schema`] if the model is unknown or its map
    /// cannot be read, otherwise the same errors as [`Device::from_schema`].
    pub fn from_registry(
        transport: T,
        registry: &ModelRegistry,
        model: &str,
    ) -> Result<Self, DeviceError> {
        let schema = registry.load(model)?;
        let mut device = Self::from_schema(transport, schema)?;
        device.info.model = Some(model.to_string());
        Ok(device)
    }

    /// Attaches descriptive metadata.
    pub fn with_info(mut self, info: DeviceInfo) -> Self {
        self.info = info;
        self
    }

    /// Replaces the command codec (e.g. for a fixed-width timestamp).
    pub fn with_codec(mut self, codec: CommandCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn aliases(&self) -> &AliasResolver {
        &self.aliases
    }

    pub fn monitor_profile(&self) -> &FieldSchema {
        &self.monitor_profile
    }

    // ── Transport delegations ─────────────────────────────────────────────────

    pub fn configure(&self) -> Result<(), DeviceError> {
        Ok(self.transport.configure()?)
    }

    pub fn refresh_monitor(&self) -> Result<(), DeviceError> {
        Ok(self.transport.refresh_monitor()?)
    }

    pub fn get_properties(&self) -> Result<Value, DeviceError> {
        Ok(self.transport.read_properties()?)
    }

    pub fn health(&self) -> Result<Value, DeviceError> {
        Ok(self.transport.health()?)
    }

    // ── Commands ──────────────────────────────────────────────────────────────

    /// Runs the command registered under `alias`.
    ///
    /// # Errors
    ///
    /// - [`CommandError::UnknownCommand`] if the alias is missing or has an
    ///   empty command string; nothing is sent.
    /// - [`CommandError::InvalidCommandEncoding`] if its hex is malformed.
    /// - [`DeviceError::Transport`] if sending fails.
    pub fn do_command(&self, alias: &str) -> Result<Value, DeviceError> {
        self.do_command_at(alias, SystemTime::now())
    }

    /// [`Device::do_command`] with an explicit timestamp.
    pub fn do_command_at(&self, alias: &str, now: SystemTime) -> Result<Value, DeviceError> {
        let payload = self.codec.encode_alias(&self.aliases, alias, now)?;
        self.send_payload(alias, payload)
    }

    /// Sends a raw hex command, bypassing the command map.
    pub fn send_command(&self, raw_command_hex: &str) -> Result<Value, DeviceError> {
        self.send_command_at(raw_command_hex, SystemTime::now())
    }

    /// [`Device::send_command`] with an explicit timestamp.
    pub fn send_command_at(
        &self,
        raw_command_hex: &str,
        now: SystemTime,
    ) -> Result<Value, DeviceError> {
        let payload = self.codec.encode(raw_command_hex, now)?;
        self.send_payload(raw_command_hex, payload)
    }

    fn send_payload(&self, command: &str, payload: String) -> Result<Value, DeviceError> {
        debug!("sending command {command} as {payload}");
        Ok(self.transport.send_wire_payload(&payload)?)
    }

    /// Command aliases from the device map, normalised and sorted.
    pub fn command_aliases(&self) -> Vec<&str> {
        self.aliases.list_command_aliases()
    }

    // ── Properties ────────────────────────────────────────────────────────────

    /// Property aliases from the device map, sorted.
    pub fn property_aliases(&self) -> Vec<&str> {
        self.aliases.list_property_aliases()
    }

    /// Raw key for a property alias; unknown aliases pass through unchanged.
    pub fn resolve_property<'a>(&'a self, alias: &'a str) -> &'a str {
        self.aliases.resolve_property(alias)
    }

    /// Reads a property by alias (or by raw key).
    pub fn get_property(&self, alias: &str) -> Result<Value, DeviceError> {
        let raw_key = self.aliases.resolve_property(alias);
        Ok(self.transport.read_raw_property(raw_key)?)
    }

    // ── Monitor ───────────────────────────────────────────────────────────────

    /// The raw monitor reading from the transport.
    pub fn monitor_snapshot(&self) -> Result<MonitorSnapshot, DeviceError> {
        Ok(self.transport.read_raw_telemetry()?)
    }

    /// A live view over this device's telemetry.
    ///
    /// Transport failures read as "no telemetry".
    pub fn monitor(&self) -> MonitorView<'_, impl TelemetrySource + '_> {
        MonitorView::new(move || self.latest_blob(), &self.monitor_profile)
    }

    /// Decodes the current telemetry once.
    ///
    /// Returns `None` if there is no telemetry, the transport fails, or the
    /// blob cannot be decoded.
    pub fn monitor_frame(&self) -> Option<DecodedFrame> {
        match self.try_monitor_frame() {
            Ok(frame) => frame,
            Err(e) => {
                debug!("discarding telemetry: {e}");
                None
            }
        }
    }

    /// Decodes the current telemetry once, reporting why it failed.
    ///
    /// `Ok(None)` means the device has not reported telemetry yet.
    ///
    /// # Errors
    ///
    /// [`DeviceError::Transport`] if the read fails, [`DeviceError::Decode`]
    /// if the blob is not valid base64.
    pub fn try_monitor_frame(&self) -> Result<Option<DecodedFrame>, DeviceError> {
        let Some(raw) = self.transport.read_raw_telemetry()?.raw_b64 else {
            return Ok(None);
        };
        Ok(Some(decode_monitor(&raw, &self.monitor_profile)?))
    }

    fn latest_blob(&self) -> Option<String> {
        match self.transport.read_raw_telemetry() {
            Ok(snapshot) => snapshot.raw_b64,
            Err(e) => {
                debug!("telemetry unavailable: {e}");
                None
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
