//! Schema-driven telemetry decoding.
//!
//! - [`schema`]: the per-model monitor profile (which bytes mean what).
//! - [`decoder`]: base64 blob + profile → [`DecodedFrame`].
//! - [`view`]: a live accessor that re-reads telemetry on every access.

pub mod decoder;
pub mod schema;
pub mod view;

pub use decoder::{
    decode_bytes, decode_monitor, BitField, DecodeError, DecodedField, DecodedFrame, EnumLabel,
    FieldValue,
};
pub use schema::{Endianness, FieldDescriptor, FieldKind, FieldSchema};
pub use view::{MonitorView, TelemetrySource};
