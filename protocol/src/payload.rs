//! # Nanoapp Payloads
//!
//! Protobuf payload structs shared with the squeeze nanoapp, plus an opaque
//! payload type for the debugging and grab messages whose schema the host
//! never interprets.
//!
//! ## Schema
//!
//! ```text
//! RecognizerStart   { 1: float progress_report_threshold, 2: float sensitivity }
//! SensitivityUpdate { 1: float sensitivity }
//! GestureProgress   { 1: float progress }
//! GestureDetected   { 1: bool host_suspended, 2: bool haptic_consumed }
//! ```

use core::fmt;

use prost::encoding::{decode_key, skip_field, DecodeContext, WireType};

/// Start the recognizer
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct RecognizerStart {
    /// Progress above which the nanoapp starts reporting `GestureProgress`
    #[prost(float, tag = "1")]
    pub progress_report_threshold: f32,
    /// Squeeze sensitivity in [0, 1]
    #[prost(float, tag = "2")]
    pub sensitivity: f32,
}

/// Update the sensitivity of a running recognizer
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct SensitivityUpdate {
    #[prost(float, tag = "1")]
    pub sensitivity: f32,
}

/// Squeeze progress report
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct GestureProgress {
    /// Progress in [0, 1]
    #[prost(float, tag = "1")]
    pub progress: f32,
}

/// Squeeze detected
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct GestureDetected {
    /// The host was suspended when the gesture completed
    #[prost(bool, tag = "1")]
    pub host_suspended: bool,
    /// The nanoapp already played a haptic for this gesture
    #[prost(bool, tag = "2")]
    pub haptic_consumed: bool,
}

/// Protobuf wire type of a top-level field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireKind {
    Varint,
    Fixed64,
    LengthDelimited,
    Group,
    Fixed32,
}

impl From<WireType> for WireKind {
    fn from(wire_type: WireType) -> Self {
        match wire_type {
            WireType::Varint => WireKind::Varint,
            WireType::SixtyFourBit => WireKind::Fixed64,
            WireType::LengthDelimited => WireKind::LengthDelimited,
            WireType::StartGroup | WireType::EndGroup => WireKind::Group,
            WireType::ThirtyTwoBit => WireKind::Fixed32,
        }
    }
}

/// Summary of one top-level field in an opaque payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSummary {
    pub tag: u32,
    pub kind: WireKind,
    /// Encoded size in bytes after the key, including any length prefix
    pub len: usize,
}

/// Payload the host carries but does not interpret (snapshot, chassis, grab)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OpaquePayload {
    bytes: Vec<u8>,
    fields: Vec<FieldSummary>,
}

impl OpaquePayload {
    /// Walk the top-level protobuf fields of `bytes`
    pub fn parse(bytes: &[u8]) -> Result<Self, prost::DecodeError> {
        let mut buf = bytes;
        let mut fields = Vec::new();

        while !buf.is_empty() {
            let (tag, wire_type) = decode_key(&mut buf)?;

            let before = buf.len();
            skip_field(wire_type, tag, &mut buf, DecodeContext::default())?;

            fields.push(FieldSummary {
                tag,
                kind: wire_type.into(),
                len: before - buf.len(),
            });
        }

        Ok(Self {
            bytes: bytes.to_vec(),
            fields,
        })
    }

    /// Raw encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Top-level fields in encounter order
    pub fn fields(&self) -> &[FieldSummary] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Display for OpaquePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes [", self.bytes.len())?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "#{} {:?}({})", field.tag, field.kind, field.len)?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_progress_wire_layout() {
        let bytes = GestureProgress { progress: 1.0 }.encode_to_vec();
        // key (1 << 3 | 5) followed by little-endian f32
        assert_eq!(bytes, [0x0d, 0x00, 0x00, 0x80, 0x3f]);
    }

    #[test]
    fn test_detected_wire_layout() {
        let msg = GestureDetected {
            host_suspended: true,
            haptic_consumed: true,
        };
        assert_eq!(msg.encode_to_vec(), [0x08, 0x01, 0x10, 0x01]);
    }

    #[test]
    fn test_opaque_field_walk() {
        // 1: varint 150, 2: "hi", 3: fixed32
        let bytes = [0x08, 0x96, 0x01, 0x12, 0x02, b'h', b'i', 0x1d, 1, 2, 3, 4];
        let payload = OpaquePayload::parse(&bytes).unwrap();

        assert_eq!(payload.as_bytes(), &bytes);
        assert_eq!(
            payload.fields(),
            &[
                FieldSummary { tag: 1, kind: WireKind::Varint, len: 2 },
                FieldSummary { tag: 2, kind: WireKind::LengthDelimited, len: 3 },
                FieldSummary { tag: 3, kind: WireKind::Fixed32, len: 4 },
            ]
        );
        assert_eq!(
            payload.to_string(),
            "12 bytes [#1 Varint(2), #2 LengthDelimited(3), #3 Fixed32(4)]"
        );
    }

    #[test]
    fn test_opaque_empty() {
        let payload = OpaquePayload::parse(&[]).unwrap();
        assert!(payload.is_empty());
        assert!(payload.fields().is_empty());
    }

    #[test]
    fn test_opaque_skips_groups() {
        // 1: group { 2: varint 1 }, 3: varint 0
        let payload = OpaquePayload::parse(&[0x0b, 0x10, 0x01, 0x0c, 0x18, 0x00]).unwrap();
        assert_eq!(
            payload.fields(),
            &[
                FieldSummary { tag: 1, kind: WireKind::Group, len: 3 },
                FieldSummary { tag: 3, kind: WireKind::Varint, len: 1 },
            ]
        );
    }

    #[test]
    fn test_opaque_rejects_truncated_field() {
        assert!(OpaquePayload::parse(&[0x12, 0x05, b'a']).is_err());
        assert!(OpaquePayload::parse(&[0x1d, 0x00]).is_err());
        assert!(OpaquePayload::parse(&[0x08, 0x80]).is_err());
    }

    #[test]
    fn test_opaque_rejects_bad_keys() {
        // tag 0
        assert!(OpaquePayload::parse(&[0x00]).is_err());
        // wire type 7
        assert!(OpaquePayload::parse(&[0x0f, 0x00]).is_err());
        // unterminated group
        assert!(OpaquePayload::parse(&[0x0b]).is_err());
        // stray end group
        assert!(OpaquePayload::parse(&[0x0c]).is_err());
    }

    #[test]
    fn test_opaque_field_number_limit() {
        // 2^29 - 1 is the largest field number
        let payload = OpaquePayload::parse(&[0xf8, 0xff, 0xff, 0xff, 0x0f, 0x00]).unwrap();
        assert_eq!(payload.fields()[0].tag, (1 << 29) - 1);

        // 2^29 does not fit
        assert!(OpaquePayload::parse(&[0x80, 0x80, 0x80, 0x80, 0x10, 0x00]).is_err());
    }
}
