//! Transport boundary.
//!
//! This crate never opens a socket.  Whatever actually talks to the appliance
//! (a local LAN session, a cloud relay, a test double) implements
//! [`DeviceTransport`], and the [`crate::device::Device`] facade calls it
//! synchronously.  Retries, timeouts and cancellation belong to the
//! implementation, not to this crate.
//!
//! # Testability
//!
//! [`mock::MockTransport`] records every call and serves canned telemetry, so
//! the device layer can be tested without hardware.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::alias::CommandDescriptor;

pub mod mock;

/// Error type for transport operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransportError {
    /// The transport does not implement this optional operation.
    #[error("transport does not support {0}")]
    Unsupported(&'static str),
    /// The device could not be reached.
    #[error("device unavailable: {0}")]
    Unavailable(String),
    /// The device answered but refused the request.
    #[error("device rejected request: {0}")]
    Rejected(String),
}

/// Raw monitor reading as delivered by a transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    /// Base64 telemetry blob; `None` until the device has reported one.
    #[serde(default)]
    pub raw_b64: Option<String>,
}

impl MonitorSnapshot {
    pub fn new(raw_b64: impl Into<String>) -> Self {
        Self {
            raw_b64: Some(raw_b64.into()),
        }
    }

    /// A snapshot with no telemetry yet.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Synchronous connection to one appliance.
pub trait DeviceTransport {
    /// Sends a base64 command payload and returns the transport's reply.
    fn send_wire_payload(&self, payload: &str) -> Result<Value, TransportError>;

    /// Returns the most recent monitor reading.
    fn read_raw_telemetry(&self) -> Result<MonitorSnapshot, TransportError>;

    /// Reads one property by its raw protocol key.
    fn read_raw_property(&self, raw_key: &str) -> Result<Value, TransportError>;

    /// Reads every property the device exposes.
    fn read_properties(&self) -> Result<Value, TransportError>;

    /// Asks the device to publish a fresh monitor reading.
    fn refresh_monitor(&self) -> Result<(), TransportError>;

    /// Transport-specific health report.
    fn health(&self) -> Result<Value, TransportError>;

    /// One-time session setup.  No-op unless the transport needs it.
    fn configure(&self) -> Result<(), TransportError> {
        Ok(())
    }

    /// `true` if the transport accepts the device's alias tables through
    /// [`DeviceTransport::set_mappings`].
    fn supports_mappings(&self) -> bool {
        false
    }

    /// Hands the alias tables to the transport.  Only called when
    /// [`DeviceTransport::supports_mappings`] returns `true`.
    fn set_mappings(
        &self,
        _commands: &BTreeMap<String, CommandDescriptor>,
        _properties: &BTreeMap<String, String>,
    ) -> Result<(), TransportError> {
        Err(TransportError::Unsupported("alias mappings"))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
