//! Wire encoding for appliance commands.
//!
//! Wire format (before base64):
//! ```text
//! [command bytes:N][timestamp:M]
//! ```
//! The command bytes come straight from the device map's hex string.  The
//! timestamp is the current Unix time in whole seconds, big-endian, with
//! leading zero bytes stripped, so `M` grows as the clock advances (4 bytes
//! for any date between 1978 and 2106).  The concatenation is encoded with
//! standard, padded base64.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

use crate::alias::AliasResolver;

/// Errors that can occur while building a command payload.
#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    /// The alias is not present in the device's command map.
    #[error("command '{0}' is not implemented by this device map")]
    UnknownCommand(String),

    /// The command's hex string is not valid hex of even length.
    #[error("invalid command encoding '{command}': {source}")]
    InvalidCommandEncoding {
        command: String,
        #[source]
        source: hex::FromHexError,
    },
}

/// How the timestamp suffix is laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampFormat {
    /// Minimal big-endian bytes; the width varies with the clock.
    #[default]
    Minimal,
    /// Big-endian, left-padded (or truncated to the low bytes) to exactly
    /// this many bytes.
    FixedWidth(u8),
}

/// Encodes raw command hex strings into base64 wire payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandCodec {
    timestamp: TimestampFormat,
}

impl CommandCodec {
    /// Creates a codec using the given timestamp layout.
    pub fn new(timestamp: TimestampFormat) -> Self {
        Self { timestamp }
    }

    /// Encodes `raw_command_hex` followed by the timestamp for `now`.
    ///
    /// Instants before the Unix epoch are treated as second 0.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::InvalidCommandEncoding`] if `raw_command_hex`
    /// is not valid hex of even length.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::time::{Duration, UNIX_EPOCH};
    /// use brewlink_core::command::CommandCodec;
    ///
    /// let at = UNIX_EPOCH + Duration::from_secs(0x10);
    /// let payload = CommandCodec::default().encode("a1", at).unwrap();
    /// assert_eq!(payload, "oRA=");
    /// ```
    pub fn encode(&self, raw_command_hex: &str, now: SystemTime) -> Result<String, CommandError> {
        let command = raw_command_hex.trim();
        let mut buf = hex::decode(command).map_err(|source| CommandError::InvalidCommandEncoding {
            command: command.to_string(),
            source,
        })?;

        let secs = now
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        buf.extend_from_slice(&self.timestamp_bytes(secs));

        Ok(STANDARD.encode(buf))
    }

    /// Encodes `raw_command_hex` using the current system time.
    ///
    /// # Errors
    ///
    /// Same as [`CommandCodec::encode`].
    pub fn encode_now(&self, raw_command_hex: &str) -> Result<String, CommandError> {
        self.encode(raw_command_hex, SystemTime::now())
    }

    /// Resolves a command alias and encodes its command for `now`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::UnknownCommand`] if the alias is not in the
    /// command map or maps to an empty command string, otherwise the same
    /// errors as [`CommandCodec::encode`].
    pub fn encode_alias(
        &self,
        aliases: &AliasResolver,
        alias: &str,
        now: SystemTime,
    ) -> Result<String, CommandError> {
        let descriptor = aliases
            .resolve_command(alias)
            .filter(|d| !d.raw.trim().is_empty())
            .ok_or_else(|| CommandError::UnknownCommand(alias.trim().to_lowercase()))?;
        self.encode(&descriptor.raw, now)
    }

    fn timestamp_bytes(&self, secs: u64) -> Vec<u8> {
        let full = secs.to_be_bytes();
        match self.timestamp {
            TimestampFormat::Minimal => {
                // Strip leading zero bytes but always emit at least one byte.
                let first = full.iter().position(|&b| b != 0).unwrap_or(full.len() - 1);
                full[first..].to_vec()
            }
            TimestampFormat::FixedWidth(width) => {
                let width = width as usize;
                if width >= full.len() {
                    let mut out = vec![0u8; width - full.len()];
                    out.extend_from_slice(&full);
                    out
                } else {
                    full[full.len() - width..].to_vec()
                }
            }
        }
    }
}

/// Encodes a command with the default (minimal) timestamp layout.
///
/// # Errors
///
/// Returns [`CommandError::InvalidCommandEncoding`] for malformed hex.
pub fn encode_command(raw_command_hex: &str, now: SystemTime) -> Result<String, CommandError> {
    CommandCodec::default().encode(raw_command_hex, now)
}

/// Encodes a command with the default layout and the current system time.
///
/// # Errors
///
/// Returns [`CommandError::InvalidCommandEncoding`] for malformed hex.
pub fn encode_command_now(raw_command_hex: &str) -> Result<String, CommandError> {
    CommandCodec::default().encode_now(raw_command_hex)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
