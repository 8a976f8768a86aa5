//! Mock transport for unit testing.
//!
//! Serves canned telemetry and properties and records every payload sent, so
//! tests can assert on the exact wire output without a device.

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde_json::{json, Value};

use super::{DeviceTransport, MonitorSnapshot, TransportError};
use crate::alias::CommandDescriptor;

type Mappings = (BTreeMap<String, CommandDescriptor>, BTreeMap<String, String>);

/// A recording implementation of [`DeviceTransport`].
#[derive(Default)]
pub struct MockTransport {
    sent: Mutex<Vec<String>>,
    telemetry: Mutex<Option<String>>,
    properties: Mutex<BTreeMap<String, Value>>,
    mappings: Mutex<Option<Mappings>>,
    accepts_mappings: bool,
    refresh_count: Mutex<u32>,
    configure_count: Mutex<u32>,
    offline: bool,
}

impl MockTransport {
    /// Creates a mock with no telemetry and no properties.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock that advertises alias-mapping support.
    pub fn with_mapping_support() -> Self {
        Self {
            accepts_mappings: true,
            ..Self::default()
        }
    }

    /// Creates a mock whose every call fails with
    /// [`TransportError::Unavailable`].
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    /// Replaces the telemetry blob served by `read_raw_telemetry`.
    pub fn set_telemetry(&self, raw_b64: Option<&str>) {
        *self.telemetry.lock().expect("lock poisoned") = raw_b64.map(str::to_string);
    }

    /// Sets the value served for a raw property key.
    pub fn set_property(&self, raw_key: &str, value: Value) {
        self.properties
            .lock()
            .expect("lock poisoned")
            .insert(raw_key.to_string(), value);
    }

    /// Every payload passed to `send_wire_payload`, oldest first.
    pub fn sent_payloads(&self) -> Vec<String> {
        self.sent.lock().expect("lock poisoned").clone()
    }

    /// The alias tables received through `set_mappings`, if any.
    pub fn received_mappings(&self) -> Option<Mappings> {
        self.mappings.lock().expect("lock poisoned").clone()
    }

    pub fn refresh_count(&self) -> u32 {
        *self.refresh_count.lock().expect("lock poisoned")
    }

    pub fn configure_count(&self) -> u32 {
        *self.configure_count.lock().expect("lock poisoned")
    }

    fn ensure_online(&self) -> Result<(), TransportError> {
        if self.offline {
            Err(TransportError::Unavailable("mock transport is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl DeviceTransport for MockTransport {
    fn send_wire_payload(&self, payload: &str) -> Result<Value, TransportError> {
        self.ensure_online()?;
        self.sent
            .lock()
            .expect("lock poisoned")
            .push(payload.to_string());
        Ok(json!({ "accepted": true }))
    }

    fn read_raw_telemetry(&self) -> Result<MonitorSnapshot, TransportError> {
        self.ensure_online()?;
        Ok(MonitorSnapshot {
            raw_b64: self.telemetry.lock().expect("lock poisoned").clone(),
        })
    }

    fn read_raw_property(&self, raw_key: &str) -> Result<Value, TransportError> {
        self.ensure_online()?;
        Ok(self
            .properties
            .lock()
            .expect("lock poisoned")
            .get(raw_key)
            .cloned()
            .unwrap_or(Value::Null))
    }

    fn read_properties(&self) -> Result<Value, TransportError> {
        self.ensure_online()?;
        let props = self.properties.lock().expect("lock poisoned");
        Ok(Value::Object(props.iter().map(|(k, v)| (k.clone(), v.clone())).collect()))
    }

    fn refresh_monitor(&self) -> Result<(), TransportError> {
        self.ensure_online()?;
        *self.refresh_count.lock().expect("lock poisoned") += 1;
        Ok(())
    }

    fn health(&self) -> Result<Value, TransportError> {
        self.ensure_online()?;
        Ok(json!({ "status": "ok", "sent": self.sent_payloads().len() }))
    }

    fn configure(&self) -> Result<(), TransportError> {
        self.ensure_online()?;
        *self.configure_count.lock().expect("lock poisoned") += 1;
        Ok(())
    }

    fn supports_mappings(&self) -> bool {
        self.accepts_mappings
    }

    fn set_mappings(
        &self,
        commands: &BTreeMap<String, CommandDescriptor>,
        properties: &BTreeMap<String, String>,
    ) -> Result<(), TransportError> {
        if !self.accepts_mappings {
            return Err(TransportError::Unsupported("alias mappings"));
        }
        let tables = (commands.clone(), properties.clone());
        *self.mappings.lock().expect("lock poisoned") = Some(tables);
        Ok(())
    }
}
