//! # Channel Adapter
//!
//! Owns the single logical channel to the squeeze nanoapp. The host's context
//! hub client sits behind two narrow traits so the adapter and the session
//! can be driven by fakes in tests:
//!
//! - [`ContextHub`]: discovers the hub and opens a client
//! - [`HubTransport`]: hands a [`NanoAppMessage`] to the hub, returning a status
//!
//! ## Inbound Path
//!
//! ```text
//! NanoAppMessage ──► endpoint filter ──► Message::decode_raw ──► Message
//!                        │                      │
//!                   (foreign: drop)      (error: warn + drop)
//! ```
//!
//! Nothing here panics or propagates transport faults into the session: send
//! failures and aborts are logged, counted and reported as values.

use log::{debug, error, trace, warn};
use serde::Serialize;
use thiserror::Error;

use crate::codec::Message;
use crate::message::MessageType;

/// Raw message as exchanged with the context hub
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NanoAppMessage {
    /// Sender (inbound) or recipient (outbound) nanoapp
    pub nanoapp_id: u64,
    /// Raw message type id
    pub message_type: u32,
    /// Encoded payload
    pub body: Vec<u8>,
}

/// Status returned by the hub for a successfully queued message
pub const TRANSACTION_SUCCESS: i32 = 0;

/// Errors opening the channel
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error("No context hub available")]
    NoHub,
    #[error("Context hub refused client: {0}")]
    ClientRejected(String),
}

/// Errors sending on the channel
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// Non-success status from the hub
    #[error("Message rejected by context hub: {0}")]
    Rejected(i32),
}

/// The remote nanoapp terminated abnormally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbortNotification {
    pub nanoapp_id: u64,
    pub code: i32,
}

/// Outbound half of a context hub client
pub trait HubTransport {
    /// Queue a message for delivery, returning the hub's status code
    ///
    /// Anything other than [`TRANSACTION_SUCCESS`] means the message was not
    /// accepted.
    fn send_message(&mut self, message: &NanoAppMessage) -> i32;
}

/// Discovery of the context hub hosting the nanoapp
pub trait ContextHub {
    type Transport: HubTransport;

    /// Open a client on the first available hub
    fn create_client(&mut self) -> Result<Self::Transport, ConnectError>;
}

impl<T: HubTransport + ?Sized> HubTransport for Box<T> {
    fn send_message(&mut self, message: &NanoAppMessage) -> i32 {
        (**self).send_message(message)
    }
}

/// Counters for channel traffic
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelStats {
    /// Messages from the configured nanoapp
    pub received: u64,
    /// Messages from other nanoapps, dropped before decoding
    pub foreign_dropped: u64,
    /// Messages from the configured nanoapp that failed to decode
    pub decode_failures: u64,
    /// Messages accepted by the hub
    pub sent: u64,
    /// Messages rejected by the hub
    pub send_failures: u64,
    /// Abort notifications for the configured nanoapp
    pub aborts: u64,
}

/// Channel to a single nanoapp
pub struct Channel<T> {
    endpoint: u64,
    transport: T,
    stats: ChannelStats,
}

impl<T: HubTransport> Channel<T> {
    /// Wrap an already opened transport
    pub fn new(transport: T, endpoint: u64) -> Self {
        Self {
            endpoint,
            transport,
            stats: ChannelStats::default(),
        }
    }

    /// Open a client on `hub` addressed to `endpoint`
    pub fn connect<H>(hub: &mut H, endpoint: u64) -> Result<Self, ConnectError>
    where
        H: ContextHub<Transport = T>,
    {
        let transport = hub.create_client()?;
        debug!("Opened context hub client for nanoapp {:#018x}", endpoint);
        Ok(Self::new(transport, endpoint))
    }

    pub fn endpoint(&self) -> u64 {
        self.endpoint
    }

    pub fn stats(&self) -> ChannelStats {
        self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send an already encoded payload
    pub fn send(&mut self, ty: MessageType, body: Vec<u8>) -> Result<(), SendError> {
        let message = NanoAppMessage {
            nanoapp_id: self.endpoint,
            message_type: ty.id(),
            body,
        };

        let status = self.transport.send_message(&message);
        if status != TRANSACTION_SUCCESS {
            self.stats.send_failures += 1;
            error!("Failed to send message of type {} to nanoapp: {}", ty, status);
            return Err(SendError::Rejected(status));
        }

        self.stats.sent += 1;
        trace!("Sent {} ({} bytes)", ty, message.body.len());
        Ok(())
    }

    /// Encode and send a message
    pub fn send_message(&mut self, message: &Message) -> Result<(), SendError> {
        let (ty, body) = message.encode();
        self.send(ty, body)
    }

    /// Filter and decode an inbound message
    ///
    /// Returns `None` when the message came from another nanoapp or could not
    /// be decoded; the latter is logged.
    pub fn receive(&mut self, message: &NanoAppMessage) -> Option<Message> {
        if message.nanoapp_id != self.endpoint {
            self.stats.foreign_dropped += 1;
            return None;
        }
        self.stats.received += 1;

        match Message::decode_raw(message.message_type, &message.body) {
            Ok(decoded) => {
                trace!("Received {}", decoded.message_type());
                Some(decoded)
            }
            Err(e) => {
                self.stats.decode_failures += 1;
                warn!(
                    "Dropping message of type {} from nanoapp: {} body={:02x?}",
                    message.message_type, e, message.body
                );
                None
            }
        }
    }

    /// Record an abort notification
    ///
    /// Returns the notification when it concerns the configured nanoapp.
    pub fn on_aborted(&mut self, nanoapp_id: u64, code: i32) -> Option<AbortNotification> {
        if nanoapp_id != self.endpoint {
            return None;
        }
        self.stats.aborts += 1;
        error!("Squeeze nanoapp aborted: {}", code);
        Some(AbortNotification { nanoapp_id, code })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{GestureProgress, SensitivityUpdate};
    use crate::test_support::{FakeHub, FakeTransport, NANOAPP};
    use prost::Message as _;

    #[test]
    fn test_connect_without_hub_fails() {
        let mut hub = FakeHub::unavailable();
        assert_eq!(
            Channel::connect(&mut hub, NANOAPP).err(),
            Some(ConnectError::NoHub)
        );
    }

    #[test]
    fn test_send_addresses_endpoint() {
        let mut hub = FakeHub::available();
        let mut channel = Channel::connect(&mut hub, NANOAPP).unwrap();

        let msg = Message::SensitivityUpdate(SensitivityUpdate { sensitivity: 0.8 });
        channel.send_message(&msg).unwrap();

        let sent = &channel.transport().sent;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].nanoapp_id, NANOAPP);
        assert_eq!(sent[0].message_type, 202);
        assert_eq!(channel.stats().sent, 1);
    }

    #[test]
    fn test_rejected_send_is_reported() {
        let mut channel = Channel::new(FakeTransport::failing(-3), NANOAPP);

        let result = channel.send(MessageType::RecognizerStop, Vec::new());

        assert_eq!(result, Err(SendError::Rejected(-3)));
        assert_eq!(channel.stats().send_failures, 1);
        assert_eq!(channel.stats().sent, 0);
    }

    #[test]
    fn test_foreign_messages_are_dropped_for_all_types() {
        let mut channel = Channel::new(FakeTransport::default(), NANOAPP);
        let body = GestureProgress { progress: 0.7 }.encode_to_vec();

        for ty in MessageType::ALL {
            let msg = NanoAppMessage {
                nanoapp_id: NANOAPP + 1,
                message_type: ty.id(),
                body: body.clone(),
            };
            assert_eq!(channel.receive(&msg), None);
        }

        let stats = channel.stats();
        assert_eq!(stats.foreign_dropped, MessageType::ALL.len() as u64);
        assert_eq!(stats.received, 0);
        assert_eq!(stats.decode_failures, 0);
    }

    #[test]
    fn test_receive_decodes_own_messages() {
        let mut channel = Channel::new(FakeTransport::default(), NANOAPP);
        let msg = NanoAppMessage {
            nanoapp_id: NANOAPP,
            message_type: 300,
            body: GestureProgress { progress: 0.7 }.encode_to_vec(),
        };

        assert_eq!(
            channel.receive(&msg),
            Some(Message::GestureProgress(GestureProgress { progress: 0.7 }))
        );
        assert_eq!(channel.stats().received, 1);
    }

    #[test]
    fn test_undecodable_messages_are_dropped() {
        let mut channel = Channel::new(FakeTransport::default(), NANOAPP);
        let unknown = NanoAppMessage {
            nanoapp_id: NANOAPP,
            message_type: 999,
            body: vec![1, 2, 3],
        };
        let malformed = NanoAppMessage {
            nanoapp_id: NANOAPP,
            message_type: 300,
            body: vec![0x0d, 0x00],
        };

        assert_eq!(channel.receive(&unknown), None);
        assert_eq!(channel.receive(&malformed), None);
        assert_eq!(channel.stats().decode_failures, 2);
    }

    #[test]
    fn test_abort_only_for_own_nanoapp() {
        let mut channel = Channel::new(FakeTransport::default(), NANOAPP);

        assert_eq!(channel.on_aborted(NANOAPP + 1, 7), None);
        assert_eq!(
            channel.on_aborted(NANOAPP, 7),
            Some(AbortNotification { nanoapp_id: NANOAPP, code: 7 })
        );
        assert_eq!(channel.stats().aborts, 1);
    }
}
