//! Telemetry frame decoder.
//!
//! Turns a base64 monitor blob into a [`DecodedFrame`] by walking a
//! [`FieldSchema`] in order.  Only a malformed base64 string is an error:
//! devices routinely report fewer bytes than the profile describes (during
//! start-up, or on older firmware), so a field that does not fit the buffer
//! is simply left out of the frame, and an enum code without a label decodes
//! to [`EnumLabel::Unknown`].

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::debug;

use crate::monitor::schema::{Endianness, FieldDescriptor, FieldKind, FieldSchema};

/// Errors that abort a decode.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    /// The telemetry string is not valid base64.
    #[error("malformed telemetry encoding: {0}")]
    MalformedEncoding(#[from] base64::DecodeError),
}

// ── Field values ──────────────────────────────────────────────────────────────

/// Set of active bits from a `bitfield` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BitField {
    /// Raw integer value; bit 0 is the least significant bit.
    pub mask: u64,
    /// Number of bits the field spans (`width * 8`).
    pub width_bits: u32,
}

impl BitField {
    pub fn is_set(&self, bit: u32) -> bool {
        bit < self.width_bits && bit < 64 && self.mask & (1u64 << bit) != 0
    }

    /// Positions of the set bits, lowest first.
    pub fn active_bits(&self) -> Vec<u32> {
        (0..self.width_bits.min(64)).filter(|&bit| self.is_set(bit)).collect()
    }
}

impl fmt::Display for BitField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.active_bits())
    }
}

/// Decoded value of an `enum` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumLabel {
    /// The code has a label in the profile's enum table.
    Known { code: u64, label: String },
    /// The code is not in the enum table.  Displays as `unknown(<code>)`.
    Unknown(u64),
}

impl EnumLabel {
    pub fn code(&self) -> u64 {
        match self {
            EnumLabel::Known { code, .. } => *code,
            EnumLabel::Unknown(code) => *code,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, EnumLabel::Known { .. })
    }
}

impl fmt::Display for EnumLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumLabel::Known { label, .. } => f.write_str(label),
            EnumLabel::Unknown(code) => write!(f, "unknown({code})"),
        }
    }
}

impl Serialize for EnumLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A single decoded field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Unsigned(u64),
    Signed(i64),
    /// An integer field with a `scale` multiplier applied.
    Scaled(f64),
    Flags(BitField),
    Label(EnumLabel),
    Bytes(Vec<u8>),
}

impl FieldValue {
    /// Integer view of unsigned, signed, flag and enum values.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Unsigned(v) => i64::try_from(*v).ok(),
            FieldValue::Signed(v) => Some(*v),
            FieldValue::Flags(bits) => i64::try_from(bits.mask).ok(),
            FieldValue::Label(label) => i64::try_from(label.code()).ok(),
            FieldValue::Scaled(_) | FieldValue::Bytes(_) => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::Unsigned(v) => Some(*v),
            FieldValue::Signed(v) => u64::try_from(*v).ok(),
            FieldValue::Flags(bits) => Some(bits.mask),
            FieldValue::Label(label) => Some(label.code()),
            FieldValue::Scaled(_) | FieldValue::Bytes(_) => None,
        }
    }

    /// Numeric view; integers are widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Scaled(v) => Some(*v),
            FieldValue::Unsigned(v) => Some(*v as f64),
            FieldValue::Signed(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_label(&self) -> Option<&EnumLabel> {
        match self {
            FieldValue::Label(label) => Some(label),
            _ => None,
        }
    }

    pub fn as_flags(&self) -> Option<BitField> {
        match self {
            FieldValue::Flags(bits) => Some(*bits),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Unsigned(v) => write!(f, "{v}"),
            FieldValue::Signed(v) => write!(f, "{v}"),
            FieldValue::Scaled(v) => write!(f, "{v}"),
            FieldValue::Flags(bits) => write!(f, "{bits}"),
            FieldValue::Label(label) => write!(f, "{label}"),
            FieldValue::Bytes(bytes) => f.write_str(&hex::encode(bytes)),
        }
    }
}

// ── Frame ─────────────────────────────────────────────────────────────────────

/// A named value inside a [`DecodedFrame`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedField {
    pub name: String,
    pub value: FieldValue,
}

/// One decoded telemetry snapshot.
///
/// Holds the fields that fit the buffer, in profile order, and the decoded
/// buffer itself for consumers that need bytes the profile does not cover.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedFrame {
    fields: Vec<DecodedField>,
    raw: Vec<u8>,
}

impl DecodedFrame {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Decoded fields in profile order.
    pub fn iter(&self) -> impl Iterator<Item = &DecodedField> {
        self.fields.iter()
    }

    /// The full base64-decoded buffer.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Number of decoded fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Decodes a base64 telemetry blob against `schema`.
///
/// Surrounding whitespace is ignored; the body must be standard, padded
/// base64.
///
/// # Errors
///
/// Returns [`DecodeError::MalformedEncoding`] if `raw_b64` is not valid
/// base64.  Short buffers are never an error.
///
/// # Examples
///
/// ```rust
/// use brewlink_core::monitor::{decode_monitor, FieldDescriptor, FieldKind, FieldSchema};
///
/// let schema = FieldSchema::new(vec![
///     FieldDescriptor::new("a", 0, 1, FieldKind::UnsignedInt),
///     FieldDescriptor::new("b", 1, 4, FieldKind::UnsignedInt),
/// ]);
/// // "AQI=" is [0x01, 0x02]: `b` does not fit and is left out.
/// let frame = decode_monitor("AQI=", &schema).unwrap();
/// assert_eq!(frame.get("a").and_then(|v| v.as_u64()), Some(1));
/// assert!(frame.get("b").is_none());
/// ```
pub fn decode_monitor(raw_b64: &str, schema: &FieldSchema) -> Result<DecodedFrame, DecodeError> {
    let raw = STANDARD.decode(raw_b64.trim())?;
    Ok(decode_bytes(raw, schema))
}

/// Decodes an already base64-decoded buffer against `schema`.
pub fn decode_bytes(raw: Vec<u8>, schema: &FieldSchema) -> DecodedFrame {
    let fields = schema
        .fields()
        .iter()
        .filter_map(|descriptor| {
            decode_field(&raw, descriptor).map(|value| DecodedField {
                name: descriptor.name.clone(),
                value,
            })
        })
        .collect();
    DecodedFrame { fields, raw }
}

// ── Field decoding ────────────────────────────────────────────────────────────

fn decode_field(buf: &[u8], descriptor: &FieldDescriptor) -> Option<FieldValue> {
    let Some(bytes) = descriptor.end().and_then(|end| buf.get(descriptor.offset..end)) else {
        debug!(
            "field '{}' ({} bytes at offset {}) does not fit {}-byte frame; omitted",
            descriptor.name,
            descriptor.width,
            descriptor.offset,
            buf.len()
        );
        return None;
    };

    if !descriptor.kind.is_integer() {
        return Some(FieldValue::Bytes(bytes.to_vec()));
    }

    let Some(raw) = read_uint(bytes, descriptor.endianness) else {
        debug!(
            "field '{}' is {} bytes wide; integer kinds support at most 8; omitted",
            descriptor.name, descriptor.width
        );
        return None;
    };

    let value = match descriptor.kind {
        FieldKind::UnsignedInt => match descriptor.scale {
            Some(scale) => FieldValue::Scaled(raw as f64 * scale),
            None => FieldValue::Unsigned(raw),
        },
        FieldKind::SignedInt => {
            let signed = sign_extend(raw, bytes.len());
            match descriptor.scale {
                Some(scale) => FieldValue::Scaled(signed as f64 * scale),
                None => FieldValue::Signed(signed),
            }
        }
        FieldKind::Bitfield => FieldValue::Flags(BitField {
            mask: raw,
            width_bits: (bytes.len() * 8) as u32,
        }),
        FieldKind::Enum => FieldValue::Label(match descriptor.enum_table.get(&raw) {
            Some(label) => EnumLabel::Known {
                code: raw,
                label: label.clone(),
            },
            None => EnumLabel::Unknown(raw),
        }),
        FieldKind::RawBytes => FieldValue::Bytes(bytes.to_vec()),
    };
    Some(value)
}

/// Reads 1 to 8 bytes as an unsigned integer.
fn read_uint(bytes: &[u8], endianness: Endianness) -> Option<u64> {
    if bytes.is_empty() || bytes.len() > 8 {
        return None;
    }
    let fold = |acc: u64, b: &u8| (acc << 8) | u64::from(*b);
    Some(match endianness {
        Endianness::Big => bytes.iter().fold(0, fold),
        Endianness::Little => bytes.iter().rev().fold(0, fold),
    })
}

fn sign_extend(raw: u64, width: usize) -> i64 {
    let bits = width * 8;
    if bits >= 64 {
        return raw as i64;
    }
    let shift = 64 - bits;
    ((raw << shift) as i64) >> shift
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn b64(bytes: &[u8]) -> String {
        STANDARD.encode(bytes)
    }

    fn one(descriptor: FieldDescriptor, bytes: &[u8]) -> Option<FieldValue> {
        let schema = FieldSchema::new(vec![descriptor]);
        decode_monitor(&b64(bytes), &schema)
            .expect("decode must succeed")
            .get("f")
            .cloned()
    }

    // ── Integers ──────────────────────────────────────────────────────────────

    #[test]
    fn test_unsigned_big_endian() {
        let d = FieldDescriptor::new("f", 1, 2, FieldKind::UnsignedInt);
        assert_eq!(one(d, &[0xff, 0x01, 0x02]), Some(FieldValue::Unsigned(0x0102)));
    }

    #[test]
    fn test_unsigned_little_endian() {
        let d = FieldDescriptor::new("f", 0, 2, FieldKind::UnsignedInt)
            .with_endianness(Endianness::Little);
        assert_eq!(one(d, &[0x01, 0x02]), Some(FieldValue::Unsigned(0x0201)));
    }

    #[test]
    fn test_signed_negative_values_are_sign_extended() {
        let d = FieldDescriptor::new("f", 0, 2, FieldKind::SignedInt);
        assert_eq!(one(d, &[0xff, 0xfe]), Some(FieldValue::Signed(-2)));

        let d = FieldDescriptor::new("f", 0, 1, FieldKind::SignedInt);
        assert_eq!(one(d, &[0x80]), Some(FieldValue::Signed(-128)));
    }

    #[test]
    fn test_signed_eight_byte_field() {
        let d = FieldDescriptor::new("f", 0, 8, FieldKind::SignedInt);
        assert_eq!(one(d, &[0xff; 8]), Some(FieldValue::Signed(-1)));
    }

    #[test]
    fn test_three_byte_little_endian_signed() {
        let d = FieldDescriptor::new("f", 0, 3, FieldKind::SignedInt)
            .with_endianness(Endianness::Little);
        // 0xFFFFFE little-endian => -2
        assert_eq!(one(d, &[0xfe, 0xff, 0xff]), Some(FieldValue::Signed(-2)));
    }

    #[test]
    fn test_scale_turns_integers_into_floats() {
        let d = FieldDescriptor::new("f", 0, 2, FieldKind::UnsignedInt).with_scale(0.5);
        assert_eq!(one(d, &[0x00, 0x05]), Some(FieldValue::Scaled(2.5)));

        let d = FieldDescriptor::new("f", 0, 1, FieldKind::SignedInt).with_scale(2.0);
        assert_eq!(one(d, &[0xff]), Some(FieldValue::Scaled(-2.0)));
    }

    #[test]
    fn test_integer_wider_than_eight_bytes_is_omitted() {
        let d = FieldDescriptor::new("f", 0, 9, FieldKind::UnsignedInt);
        assert_eq!(one(d, &[0u8; 9]), None);
    }

    // ── Bitfield / enum / raw ─────────────────────────────────────────────────

    #[test]
    fn test_bitfield_exposes_active_bits() {
        let d = FieldDescriptor::new("f", 0, 1, FieldKind::Bitfield);
        let bits = one(d, &[0b0000_0101]).and_then(|v| v.as_flags()).unwrap();
        assert_eq!(bits.active_bits(), vec![0, 2]);
        assert!(bits.is_set(2));
        assert!(!bits.is_set(1));
        assert!(!bits.is_set(8), "bits beyond the field width are never set");
    }

    #[test]
    fn test_enum_known_code_maps_to_label() {
        let d = FieldDescriptor::new("f", 0, 1, FieldKind::Enum).with_label(1, "idle");
        let value = one(d, &[1]).unwrap();
        assert_eq!(value.to_string(), "idle");
        assert!(value.as_label().unwrap().is_known());
    }

    #[test]
    fn test_enum_unknown_code_maps_to_sentinel() {
        let d = FieldDescriptor::new("f", 0, 1, FieldKind::Enum).with_label(1, "idle");
        let value = one(d, &[9]).unwrap();
        assert_eq!(value, FieldValue::Label(EnumLabel::Unknown(9)));
        assert_eq!(value.to_string(), "unknown(9)");
    }

    #[test]
    fn test_raw_bytes_pass_through_unscaled() {
        let d = FieldDescriptor::new("f", 0, 3, FieldKind::RawBytes).with_scale(10.0);
        assert_eq!(one(d, &[1, 2, 3, 4, 5]), Some(FieldValue::Bytes(vec![1, 2, 3])));
    }

    #[test]
    fn test_wide_raw_bytes_are_allowed() {
        let d = FieldDescriptor::new("f", 0, 12, FieldKind::RawBytes);
        assert_eq!(one(d, &[7u8; 12]), Some(FieldValue::Bytes(vec![7u8; 12])));
    }

    // ── Frame-level behaviour ─────────────────────────────────────────────────

    #[test]
    fn test_partial_frame_omits_fields_that_do_not_fit() {
        // Arrange
        let schema = FieldSchema::new(vec![
            FieldDescriptor::new("short", 0, 2, FieldKind::UnsignedInt),
            FieldDescriptor::new("long", 0, 4, FieldKind::UnsignedInt),
        ]);

        // Act
        let frame = decode_monitor(&b64(&[0x00, 0x2a]), &schema).unwrap();

        // Assert
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.get("short"), Some(&FieldValue::Unsigned(42)));
        assert!(!frame.contains("long"));
        assert_eq!(frame.raw(), &[0x00, 0x2a]);
    }

    #[test]
    fn test_offset_overflow_is_omitted_not_panicking() {
        let schema = FieldSchema::new(vec![FieldDescriptor::new(
            "huge",
            usize::MAX,
            2,
            FieldKind::RawBytes,
        )]);
        let frame = decode_monitor(&b64(&[1, 2, 3]), &schema).unwrap();
        assert!(frame.is_empty());
    }

    #[test]
    fn test_empty_buffer_yields_empty_frame() {
        let schema = FieldSchema::new(vec![FieldDescriptor::new("a", 0, 1, FieldKind::Enum)]);
        let frame = decode_monitor("", &schema).unwrap();
        assert!(frame.is_empty());
        assert!(frame.raw().is_empty());
    }

    #[test]
    fn test_fields_keep_profile_order() {
        let schema = FieldSchema::new(vec![
            FieldDescriptor::new("z", 1, 1, FieldKind::UnsignedInt),
            FieldDescriptor::new("a", 0, 1, FieldKind::UnsignedInt),
        ]);
        let frame = decode_monitor(&b64(&[1, 2]), &schema).unwrap();
        let names: Vec<_> = frame.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["z", "a"]);
    }

    #[test]
    fn test_malformed_base64_is_rejected() {
        let err = decode_monitor("not-valid-base64!!", &FieldSchema::default()).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedEncoding(_)));
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let schema =
            FieldSchema::new(vec![FieldDescriptor::new("a", 0, 1, FieldKind::UnsignedInt)]);
        let frame = decode_monitor("  AQ==\n", &schema).unwrap();
        assert_eq!(frame.get("a"), Some(&FieldValue::Unsigned(1)));
    }

    #[test]
    fn test_field_value_conversions() {
        assert_eq!(FieldValue::Unsigned(5).as_i64(), Some(5));
        assert_eq!(FieldValue::Signed(-5).as_u64(), None);
        assert_eq!(FieldValue::Signed(-5).as_f64(), Some(-5.0));
        assert_eq!(FieldValue::Label(EnumLabel::Unknown(3)).as_u64(), Some(3));
        assert_eq!(FieldValue::Bytes(vec![0xab]).to_string(), "ab");
        assert_eq!(FieldValue::Scaled(1.5).as_i64(), None);
    }

    #[test]
    fn test_field_values_serialize_as_plain_json() {
        let known = FieldValue::Label(EnumLabel::Known { code: 1, label: "idle".into() });
        assert_eq!(serde_json::to_string(&known).unwrap(), "\"idle\"");
        let unknown = FieldValue::Label(EnumLabel::Unknown(9));
        assert_eq!(serde_json::to_string(&unknown).unwrap(), "\"unknown(9)\"");
        assert_eq!(serde_json::to_string(&FieldValue::Signed(-3)).unwrap(), "-3");
    }
}
