//! # Message Codec
//!
//! Typed view of every nanoapp message. Inbound bytes are resolved once into a
//! [`Message`] variant so consumers match on payloads instead of integer tags.
//!
//! Encoding is total and decoding is its exact inverse for well-formed input:
//!
//! ```rust
//! use squeeze_protocol::codec::Message;
//! use squeeze_protocol::payload::SensitivityUpdate;
//!
//! let msg = Message::SensitivityUpdate(SensitivityUpdate { sensitivity: 0.8 });
//! let (ty, bytes) = msg.encode();
//! assert_eq!(Message::decode(ty, &bytes), Ok(msg));
//! ```

use prost::Message as ProtoMessage;
use thiserror::Error;

use crate::message::MessageType;
use crate::payload::{
    GestureDetected, GestureProgress, OpaquePayload, RecognizerStart, SensitivityUpdate,
};

/// Errors while decoding an inbound payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Identifier is not in the catalog
    #[error("unknown message type {0}")]
    UnknownType(u32),
    /// Bytes do not match the schema of a known type
    #[error("malformed {ty} payload: {reason}")]
    Malformed { ty: MessageType, reason: String },
}

impl DecodeError {
    fn malformed(ty: MessageType, reason: impl ToString) -> Self {
        Self::Malformed {
            ty,
            reason: reason.to_string(),
        }
    }
}

/// Complete message enum for the nanoapp protocol
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    RecognizerStart(RecognizerStart),
    RecognizerStop,
    SensitivityUpdate(SensitivityUpdate),
    SnapshotRequest,
    ChassisRequest,
    GrabRecognizerStart,
    GrabRecognizerStop,
    GestureProgress(GestureProgress),
    GestureDetected(GestureDetected),
    SnapshotResponse(OpaquePayload),
    ChassisResponse(OpaquePayload),
    GrabDetected(OpaquePayload),
    GrabReleased(OpaquePayload),
}

impl Message {
    /// Get the message type
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::RecognizerStart(_) => MessageType::RecognizerStart,
            Message::RecognizerStop => MessageType::RecognizerStop,
            Message::SensitivityUpdate(_) => MessageType::SensitivityUpdate,
            Message::SnapshotRequest => MessageType::SnapshotRequest,
            Message::ChassisRequest => MessageType::ChassisRequest,
            Message::GrabRecognizerStart => MessageType::GrabRecognizerStart,
            Message::GrabRecognizerStop => MessageType::GrabRecognizerStop,
            Message::GestureProgress(_) => MessageType::GestureProgress,
            Message::GestureDetected(_) => MessageType::GestureDetected,
            Message::SnapshotResponse(_) => MessageType::SnapshotResponse,
            Message::ChassisResponse(_) => MessageType::ChassisResponse,
            Message::GrabDetected(_) => MessageType::GrabDetected,
            Message::GrabReleased(_) => MessageType::GrabReleased,
        }
    }

    /// Serialize the payload, returning it with its type tag
    pub fn encode(&self) -> (MessageType, Vec<u8>) {
        let bytes = match self {
            Message::RecognizerStart(msg) => msg.encode_to_vec(),
            Message::SensitivityUpdate(msg) => msg.encode_to_vec(),
            Message::GestureProgress(msg) => msg.encode_to_vec(),
            Message::GestureDetected(msg) => msg.encode_to_vec(),
            Message::RecognizerStop
            | Message::SnapshotRequest
            | Message::ChassisRequest
            | Message::GrabRecognizerStart
            | Message::GrabRecognizerStop => Vec::new(),
            Message::SnapshotResponse(payload)
            | Message::ChassisResponse(payload)
            | Message::GrabDetected(payload)
            | Message::GrabReleased(payload) => payload.as_bytes().to_vec(),
        };
        (self.message_type(), bytes)
    }

    /// Deserialize a payload of a known type
    pub fn decode(ty: MessageType, bytes: &[u8]) -> Result<Self, DecodeError> {
        let opaque = |bytes: &[u8]| {
            OpaquePayload::parse(bytes).map_err(|e| DecodeError::malformed(ty, e))
        };
        let empty = |msg: Message| {
            if bytes.is_empty() {
                Ok(msg)
            } else {
                Err(DecodeError::malformed(
                    ty,
                    format!("expected empty body, got {} bytes", bytes.len()),
                ))
            }
        };

        match ty {
            MessageType::RecognizerStart => RecognizerStart::decode(bytes)
                .map(Message::RecognizerStart)
                .map_err(|e| DecodeError::malformed(ty, e)),
            MessageType::SensitivityUpdate => SensitivityUpdate::decode(bytes)
                .map(Message::SensitivityUpdate)
                .map_err(|e| DecodeError::malformed(ty, e)),
            MessageType::GestureProgress => GestureProgress::decode(bytes)
                .map(Message::GestureProgress)
                .map_err(|e| DecodeError::malformed(ty, e)),
            MessageType::GestureDetected => GestureDetected::decode(bytes)
                .map(Message::GestureDetected)
                .map_err(|e| DecodeError::malformed(ty, e)),
            MessageType::RecognizerStop => empty(Message::RecognizerStop),
            MessageType::SnapshotRequest => empty(Message::SnapshotRequest),
            MessageType::ChassisRequest => empty(Message::ChassisRequest),
            MessageType::GrabRecognizerStart => empty(Message::GrabRecognizerStart),
            MessageType::GrabRecognizerStop => empty(Message::GrabRecognizerStop),
            MessageType::SnapshotResponse => opaque(bytes).map(Message::SnapshotResponse),
            MessageType::ChassisResponse => opaque(bytes).map(Message::ChassisResponse),
            MessageType::GrabDetected => opaque(bytes).map(Message::GrabDetected),
            MessageType::GrabReleased => opaque(bytes).map(Message::GrabReleased),
        }
    }

    /// Deserialize a payload identified by its raw wire id
    pub fn decode_raw(id: u32, bytes: &[u8]) -> Result<Self, DecodeError> {
        let ty = MessageType::try_from(id).map_err(DecodeError::UnknownType)?;
        Self::decode(ty, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opaque(bytes: &[u8]) -> OpaquePayload {
        OpaquePayload::parse(bytes).unwrap()
    }

    fn sample(ty: MessageType) -> Message {
        match ty {
            MessageType::RecognizerStart => Message::RecognizerStart(RecognizerStart {
                progress_report_threshold: 0.5,
                sensitivity: 0.25,
            }),
            MessageType::RecognizerStop => Message::RecognizerStop,
            MessageType::SensitivityUpdate => {
                Message::SensitivityUpdate(SensitivityUpdate { sensitivity: 0.8 })
            }
            MessageType::SnapshotRequest => Message::SnapshotRequest,
            MessageType::ChassisRequest => Message::ChassisRequest,
            MessageType::GrabRecognizerStart => Message::GrabRecognizerStart,
            MessageType::GrabRecognizerStop => Message::GrabRecognizerStop,
            MessageType::GestureProgress => {
                Message::GestureProgress(GestureProgress { progress: 0.73 })
            }
            MessageType::GestureDetected => Message::GestureDetected(GestureDetected {
                host_suspended: true,
                haptic_consumed: false,
            }),
            MessageType::SnapshotResponse => {
                Message::SnapshotResponse(opaque(&[0x08, 0x2a, 0x12, 0x01, 0xff]))
            }
            MessageType::ChassisResponse => Message::ChassisResponse(opaque(&[0x15, 0, 0, 0, 0])),
            MessageType::GrabDetected => Message::GrabDetected(opaque(&[])),
            MessageType::GrabReleased => Message::GrabReleased(opaque(&[0x08, 0x01])),
        }
    }

    #[test]
    fn test_every_type_roundtrips() {
        for ty in MessageType::ALL {
            let msg = sample(ty);
            let (encoded_ty, bytes) = msg.encode();
            assert_eq!(encoded_ty, ty);
            assert_eq!(Message::decode(ty, &bytes), Ok(msg));
        }
    }

    #[test]
    fn test_decode_raw_unknown_type() {
        assert_eq!(
            Message::decode_raw(299, &[]),
            Err(DecodeError::UnknownType(299))
        );
    }

    #[test]
    fn test_decode_raw_known_type() {
        let bytes = GestureProgress { progress: 0.6 }.encode_to_vec();
        assert_eq!(
            Message::decode_raw(300, &bytes),
            Ok(Message::GestureProgress(GestureProgress { progress: 0.6 }))
        );
    }

    #[test]
    fn test_truncated_progress_is_malformed() {
        let result = Message::decode(MessageType::GestureProgress, &[0x0d, 0x00, 0x00]);
        assert!(matches!(
            result,
            Err(DecodeError::Malformed { ty: MessageType::GestureProgress, .. })
        ));
    }

    #[test]
    fn test_empty_message_with_body_is_malformed() {
        let result = Message::decode(MessageType::RecognizerStop, &[0x08, 0x01]);
        assert!(matches!(
            result,
            Err(DecodeError::Malformed { ty: MessageType::RecognizerStop, .. })
        ));
    }

    #[test]
    fn test_garbage_snapshot_is_malformed() {
        let result = Message::decode(MessageType::SnapshotResponse, &[0x12, 0x09, 0x00]);
        assert!(matches!(
            result,
            Err(DecodeError::Malformed { ty: MessageType::SnapshotResponse, .. })
        ));
    }

    #[test]
    fn test_empty_progress_decodes_to_zero() {
        assert_eq!(
            Message::decode(MessageType::GestureProgress, &[]),
            Ok(Message::GestureProgress(GestureProgress { progress: 0.0 }))
        );
    }
}
