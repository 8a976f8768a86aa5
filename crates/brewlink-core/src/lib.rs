//! # brewlink-core
//!
//! Schema-driven protocol layer for networked coffee appliances.  Turns
//! human-facing command names into timestamped wire payloads and raw
//! telemetry blobs into named, typed values.
//!
//! The crate never opens a socket.  It talks to the appliance through the
//! [`transport::DeviceTransport`] trait, which the application implements.
//!
//! # Architecture overview (for beginners)
//!
//! Every appliance model ships with a *device map*: a JSON or TOML document
//! that says which hex command brews an espresso, which raw key holds the
//! water temperature, and which bytes of the monitor blob carry the machine
//! status.  Nothing about a model is hard-coded here; supporting a new model
//! means writing a new device map.
//!
//! - **`alias`** – Tables that translate human aliases (`"espresso"`) into raw
//!   protocol keys and hex commands.
//!
//! - **`command`** – The wire codec: command bytes plus a big-endian Unix
//!   timestamp, base64-encoded.
//!
//! - **`monitor`** – The monitor profile (which bytes mean what), the decoder
//!   that applies it to a telemetry blob, and a live view that re-reads the
//!   telemetry on every access.
//!
//! - **`schema`** – Loading device maps from disk and looking them up by
//!   model name.
//!
//! - **`transport`** – The trait boundary to whatever carries bytes to the
//!   appliance, plus a recording mock for tests.
//!
//! - **`device`** – The facade that ties one device map to one transport.

pub mod alias;
pub mod command;
pub mod device;
pub mod monitor;
pub mod schema;
pub mod transport;

// Re-export the most-used types at the crate root so callers can write
// `brewlink_core::Device` instead of `brewlink_core::device::Device`.
pub use alias::{AliasResolver, CommandDescriptor};
pub use command::{encode_command, encode_command_now, CommandCodec, CommandError, TimestampFormat};
pub use device::{Device, DeviceError, DeviceInfo};
pub use monitor::{
    decode_monitor, DecodeError, DecodedFrame, FieldDescriptor, FieldKind, FieldSchema, FieldValue,
    MonitorView,
};
pub use schema::{load_device_schema, DeviceSchema, ModelRegistry, SchemaError};
pub use transport::{DeviceTransport, MonitorSnapshot, TransportError};
