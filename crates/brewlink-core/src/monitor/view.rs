//! Live, schema-aware view over telemetry.
//!
//! A [`MonitorView`] holds a *source* of raw telemetry rather than a decoded
//! frame, so every accessor reflects the latest reading.  Callers that need
//! several values from one consistent reading take a [`MonitorView::snapshot`]
//! and read from the returned frame.
//!
//! Missing telemetry, a malformed blob, and a field the profile does not
//! define all read as `None`: "currently unknown", not a fault.

use tracing::debug;

use crate::monitor::decoder::{decode_monitor, BitField, DecodedFrame, EnumLabel, FieldValue};
use crate::monitor::schema::FieldSchema;

/// Supplies the most recent raw base64 telemetry, if any.
pub trait TelemetrySource {
    fn raw_telemetry(&self) -> Option<String>;
}

impl<F> TelemetrySource for F
where
    F: Fn() -> Option<String>,
{
    fn raw_telemetry(&self) -> Option<String> {
        self()
    }
}

/// Read-only accessor pairing a telemetry source with a monitor profile.
pub struct MonitorView<'a, S> {
    source: S,
    schema: &'a FieldSchema,
}

impl<'a, S: TelemetrySource> MonitorView<'a, S> {
    pub fn new(source: S, schema: &'a FieldSchema) -> Self {
        Self { source, schema }
    }

    /// The profile this view decodes with.
    pub fn schema(&self) -> &FieldSchema {
        self.schema
    }

    /// `true` if the active profile defines `name`.
    pub fn defines(&self, name: &str) -> bool {
        self.schema.field(name).is_some()
    }

    /// Field names of the active profile, in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.schema.names()
    }

    /// Reads and decodes the current telemetry.
    ///
    /// Returns `None` when the source has nothing or the blob is malformed.
    pub fn snapshot(&self) -> Option<DecodedFrame> {
        let raw = self.source.raw_telemetry()?;
        match decode_monitor(&raw, self.schema) {
            Ok(frame) => Some(frame),
            Err(e) => {
                debug!("discarding telemetry: {e}");
                None
            }
        }
    }

    /// Fresh read of a single field.
    pub fn get(&self, name: &str) -> Option<FieldValue> {
        if !self.defines(name) {
            return None;
        }
        self.snapshot()?.get(name).cloned()
    }

    pub fn get_u64(&self, name: &str) -> Option<u64> {
        self.get(name)?.as_u64()
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name)?.as_i64()
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name)?.as_f64()
    }

    pub fn get_label(&self, name: &str) -> Option<EnumLabel> {
        self.get(name)?.as_label().cloned()
    }

    pub fn get_flags(&self, name: &str) -> Option<BitField> {
        self.get(name)?.as_flags()
    }

    pub fn get_bytes(&self, name: &str) -> Option<Vec<u8>> {
        self.get(name)?.as_bytes().map(<[u8]>::to_vec)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;

    use super::*;
    use crate::monitor::schema::{FieldDescriptor, FieldKind};

    fn schema() -> FieldSchema {
        FieldSchema::new(vec![
            FieldDescriptor::new("status", 0, 1, FieldKind::Enum).with_label(7, "ready"),
            FieldDescriptor::new("temp", 1, 2, FieldKind::UnsignedInt).with_scale(0.1),
            FieldDescriptor::new("alarms", 3, 1, FieldKind::Bitfield),
            FieldDescriptor::new("serial", 4, 2, FieldKind::RawBytes),
        ])
    }

    #[test]
    fn test_get_reads_named_fields() {
        let schema = schema();
        let blob = STANDARD.encode([7u8, 0x03, 0xe8, 0b10, 0xca, 0xfe]);
        let view = MonitorView::new(|| Some(blob.clone()), &schema);

        assert_eq!(view.get_label("status").map(|l| l.to_string()), Some("ready".into()));
        assert_eq!(view.get_f64("temp"), Some(100.0));
        assert_eq!(view.get_flags("alarms").map(|b| b.active_bits()), Some(vec![1]));
        assert_eq!(view.get_bytes("serial"), Some(vec![0xca, 0xfe]));
    }

    #[test]
    fn test_missing_telemetry_reads_as_none() {
        let schema = schema();
        let view = MonitorView::new(|| None::<String>, &schema);
        assert!(view.snapshot().is_none());
        assert!(view.get("status").is_none());
    }

    #[test]
    fn test_field_outside_profile_reads_as_none() {
        let schema = schema();
        let blob = STANDARD.encode([7u8]);
        let view = MonitorView::new(|| Some(blob.clone()), &schema);
        assert!(!view.defines("pressure"));
        assert!(view.get("pressure").is_none());
    }

    #[test]
    fn test_malformed_telemetry_reads_as_none() {
        let schema = schema();
        let view = MonitorView::new(|| Some("***".to_string()), &schema);
        assert!(view.get("status").is_none());
    }

    #[test]
    fn test_each_access_reflects_the_latest_reading() {
        // Arrange: the source returns a different reading on every call.
        let schema = schema();
        let readings = RefCell::new(vec![STANDARD.encode([9u8]), STANDARD.encode([7u8])]);
        let view = MonitorView::new(|| readings.borrow_mut().pop(), &schema);

        // Act / Assert
        assert_eq!(
            view.get_label("status"),
            Some(EnumLabel::Known {
                code: 7,
                label: "ready".into()
            })
        );
        assert_eq!(view.get_label("status"), Some(EnumLabel::Unknown(9)));
        assert_eq!(view.get_label("status"), None);
    }

    #[test]
    fn test_field_names_follow_profile() {
        let schema = schema();
        let view = MonitorView::new(|| None::<String>, &schema);
        assert_eq!(
            view.field_names().collect::<Vec<_>>(),
            vec!["status", "temp", "alarms", "serial"]
        );
    }
}
