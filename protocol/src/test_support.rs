//! Recording fakes for the hub seams.

use crate::channel::{ConnectError, ContextHub, HubTransport, NanoAppMessage, TRANSACTION_SUCCESS};

pub const NANOAPP: u64 = crate::NANOAPP_ID;

/// Transport that records every message and answers with a fixed status
#[derive(Debug)]
pub struct FakeTransport {
    pub sent: Vec<NanoAppMessage>,
    pub status: i32,
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self {
            sent: Vec::new(),
            status: TRANSACTION_SUCCESS,
        }
    }
}

impl FakeTransport {
    pub fn failing(status: i32) -> Self {
        Self {
            sent: Vec::new(),
            status,
        }
    }
}

impl HubTransport for FakeTransport {
    fn send_message(&mut self, message: &NanoAppMessage) -> i32 {
        self.sent.push(message.clone());
        self.status
    }
}

pub struct FakeHub {
    pub available: bool,
    /// Status returned by transports this hub hands out
    pub status: i32,
}

impl FakeHub {
    pub fn available() -> Self {
        Self {
            available: true,
            status: TRANSACTION_SUCCESS,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            status: TRANSACTION_SUCCESS,
        }
    }

    pub fn rejecting(status: i32) -> Self {
        Self {
            available: true,
            status,
        }
    }
}

impl ContextHub for FakeHub {
    type Transport = FakeTransport;

    fn create_client(&mut self) -> Result<FakeTransport, ConnectError> {
        if self.available {
            Ok(FakeTransport {
                sent: Vec::new(),
                status: self.status,
            })
        } else {
            Err(ConnectError::NoHub)
        }
    }
}
