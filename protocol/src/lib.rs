//! # Squeeze Protocol Library
//!
//! This crate provides the core of the squeeze gesture bridge between the
//! always-on recognizer nanoapp and the host UI:
//!
//! - **Message Catalog**: The 13 nanoapp message types and their directions
//! - **Codec**: Protobuf payloads resolved into a typed [`Message`]
//! - **Channel Adapter**: Endpoint filtering and best-effort sends
//! - **Gesture Session**: Progress debounce and effect dispatch
//!
//! ## Architecture
//!
//! ```text
//! Context Hub ──► Channel ──► Message::decode ──► GestureSession ──► EffectSink
//!      ▲                                               │             (haptics,
//!      │                                               │              screenshot)
//!      └───────── Channel ◄── Message::encode ◄────────┘
//!                         (start / stop / sensitivity)
//! ```
//!
//! The session and channel are plain synchronous state; the host decides how
//! messages reach them and must deliver them one at a time, in order.

pub mod channel;
pub mod codec;
pub mod config;
pub mod effects;
pub mod message;
pub mod payload;
pub mod session;

#[cfg(test)]
mod test_support;

// Re-export main types for convenience
pub use channel::{
    AbortNotification, Channel, ChannelStats, ConnectError, ContextHub, HubTransport,
    NanoAppMessage, SendError,
};
pub use codec::{DecodeError, Message};
pub use config::{ConfigError, SessionConfig};
pub use effects::{Effect, EffectSink, Haptic, ScreenshotRequest};
pub use message::{Direction, MessageType};
pub use session::{GestureSession, GestureState, SessionError, SessionStats};

/// Library version for protocol compatibility checks
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Identifier of the squeeze recognizer nanoapp
pub const NANOAPP_ID: u64 = 0x476f_6f67_6c00_100e;
