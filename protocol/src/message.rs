//! # Nanoapp Message Catalog
//!
//! The closed set of message types exchanged with the squeeze recognizer
//! nanoapp. Identifiers are a wire contract with the nanoapp and must match
//! its catalog exactly.
//!
//! ## Ranges
//!
//! | Range   | Direction     | Purpose                         |
//! |---------|---------------|---------------------------------|
//! | 200-206 | host → hub    | Recognizer control and requests |
//! | 300-305 | hub → host    | Gesture events and responses    |

use core::fmt;

/// Which way a message travels on the channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Control messages sent by the host to the nanoapp
    ToHub,
    /// Events and responses sent by the nanoapp to the host
    ToHost,
}

/// Message types understood by the squeeze nanoapp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MessageType {
    /// Start the recognizer with a threshold and sensitivity
    RecognizerStart = 200,
    /// Stop the recognizer
    RecognizerStop = 201,
    /// Push a new sensitivity to a running recognizer
    SensitivityUpdate = 202,
    /// Request a debugging snapshot
    SnapshotRequest = 203,
    /// Request chassis calibration data
    ChassisRequest = 204,
    /// Start the grab recognizer
    GrabRecognizerStart = 205,
    /// Stop the grab recognizer
    GrabRecognizerStop = 206,
    /// Squeeze progress report
    GestureProgress = 300,
    /// Squeeze detected
    GestureDetected = 301,
    /// Debugging snapshot
    SnapshotResponse = 302,
    /// Chassis calibration data
    ChassisResponse = 303,
    /// Grab detected
    GrabDetected = 304,
    /// Grab released
    GrabReleased = 305,
}

impl MessageType {
    /// Every message type in catalog order
    pub const ALL: [MessageType; 13] = [
        Self::RecognizerStart,
        Self::RecognizerStop,
        Self::SensitivityUpdate,
        Self::SnapshotRequest,
        Self::ChassisRequest,
        Self::GrabRecognizerStart,
        Self::GrabRecognizerStop,
        Self::GestureProgress,
        Self::GestureDetected,
        Self::SnapshotResponse,
        Self::ChassisResponse,
        Self::GrabDetected,
        Self::GrabReleased,
    ];

    /// Numeric identifier used on the wire
    #[inline]
    pub const fn id(self) -> u32 {
        self as u32
    }

    /// Direction this message type travels in
    pub const fn direction(self) -> Direction {
        match self {
            Self::RecognizerStart
            | Self::RecognizerStop
            | Self::SensitivityUpdate
            | Self::SnapshotRequest
            | Self::ChassisRequest
            | Self::GrabRecognizerStart
            | Self::GrabRecognizerStop => Direction::ToHub,
            Self::GestureProgress
            | Self::GestureDetected
            | Self::SnapshotResponse
            | Self::ChassisResponse
            | Self::GrabDetected
            | Self::GrabReleased => Direction::ToHost,
        }
    }
}

impl TryFrom<u32> for MessageType {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            200 => Ok(Self::RecognizerStart),
            201 => Ok(Self::RecognizerStop),
            202 => Ok(Self::SensitivityUpdate),
            203 => Ok(Self::SnapshotRequest),
            204 => Ok(Self::ChassisRequest),
            205 => Ok(Self::GrabRecognizerStart),
            206 => Ok(Self::GrabRecognizerStop),
            300 => Ok(Self::GestureProgress),
            301 => Ok(Self::GestureDetected),
            302 => Ok(Self::SnapshotResponse),
            303 => Ok(Self::ChassisResponse),
            304 => Ok(Self::GrabDetected),
            305 => Ok(Self::GrabReleased),
            other => Err(other),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_match_nanoapp_catalog() {
        assert_eq!(MessageType::RecognizerStart.id(), 200);
        assert_eq!(MessageType::GrabRecognizerStop.id(), 206);
        assert_eq!(MessageType::GestureProgress.id(), 300);
        assert_eq!(MessageType::GrabReleased.id(), 305);
    }

    #[test]
    fn test_message_type_conversion() {
        for ty in MessageType::ALL {
            assert_eq!(MessageType::try_from(ty.id()), Ok(ty));
        }
        assert_eq!(MessageType::try_from(207), Err(207));
        assert_eq!(MessageType::try_from(0), Err(0));
    }

    #[test]
    fn test_directions() {
        let to_hub = MessageType::ALL
            .iter()
            .filter(|ty| ty.direction() == Direction::ToHub)
            .count();
        assert_eq!(to_hub, 7);
        assert_eq!(MessageType::GestureDetected.direction(), Direction::ToHost);
        assert_eq!(MessageType::SensitivityUpdate.direction(), Direction::ToHub);
    }
}
