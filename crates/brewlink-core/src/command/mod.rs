//! Command payload construction.

pub mod codec;

pub use codec::{encode_command, encode_command_now, CommandCodec, CommandError, TimestampFormat};
