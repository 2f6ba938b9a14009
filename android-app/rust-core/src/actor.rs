//! # Session Actor
//!
//! Hub callbacks and host configuration calls arrive on arbitrary JVM threads.
//! The gesture session is owned by a single actor thread instead, fed through
//! an unbounded FIFO queue, so transitions never interleave and messages are
//! applied in arrival order.
//!
//! ```text
//! JNI threads ──► mpsc::UnboundedSender<Command> ──► actor thread ──► GestureSession
//!                                                  (current-thread tokio runtime)
//! ```

use std::thread::{self, JoinHandle};

use log::{debug, error};
use squeeze_protocol::channel::{HubTransport, NanoAppMessage};
use squeeze_protocol::effects::EffectSink;
use squeeze_protocol::session::{GestureSession, SessionError, SessionStats};
use tokio::sync::{mpsc, oneshot};

use crate::BridgeError;

/// Work items for the session actor
#[derive(Debug)]
pub enum Command {
    /// Raw message from the hub client
    Message(NanoAppMessage),
    /// Nanoapp abort notification
    Aborted { nanoapp_id: u64, code: i32 },
    Enable,
    Disable,
    SetSensitivity {
        value: f32,
        reply: oneshot::Sender<Result<f32, SessionError>>,
    },
    Stats(oneshot::Sender<SessionStats>),
    Shutdown,
}

/// Handle to the thread owning the gesture session
pub struct SessionActor {
    tx: mpsc::UnboundedSender<Command>,
    thread: Option<JoinHandle<()>>,
}

impl SessionActor {
    /// Move `session` onto a dedicated actor thread
    pub fn spawn<T, E>(session: GestureSession<T, E>) -> Result<Self, BridgeError>
    where
        T: HubTransport + Send + 'static,
        E: EffectSink + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let runtime = tokio::runtime::Builder::new_current_thread().build()?;

        let thread = thread::Builder::new()
            .name("squeeze-session".to_string())
            .spawn(move || runtime.block_on(run(session, rx)))?;

        Ok(Self {
            tx,
            thread: Some(thread),
        })
    }

    fn send(&self, command: Command) -> Result<(), BridgeError> {
        self.tx.send(command).map_err(|_| BridgeError::SessionClosed)
    }

    pub fn on_message(&self, message: NanoAppMessage) -> Result<(), BridgeError> {
        self.send(Command::Message(message))
    }

    pub fn on_aborted(&self, nanoapp_id: u64, code: i32) -> Result<(), BridgeError> {
        self.send(Command::Aborted { nanoapp_id, code })
    }

    pub fn enable(&self) -> Result<(), BridgeError> {
        self.send(Command::Enable)
    }

    pub fn disable(&self) -> Result<(), BridgeError> {
        self.send(Command::Disable)
    }

    /// Store and push a sensitivity, waiting for the send status
    ///
    /// Must not be called from inside an async context.
    pub fn set_sensitivity(&self, value: f32) -> Result<f32, BridgeError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::SetSensitivity { value, reply })?;

        let applied = rx.blocking_recv().map_err(|_| BridgeError::SessionClosed)?;
        Ok(applied?)
    }

    /// Must not be called from inside an async context.
    pub fn stats(&self) -> Result<SessionStats, BridgeError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Stats(reply))?;
        rx.blocking_recv().map_err(|_| BridgeError::SessionClosed)
    }
}

impl Drop for SessionActor {
    fn drop(&mut self) {
        let _ = self.tx.send(Command::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Session actor panicked");
            }
        }
    }
}

/// Apply commands to the session until shutdown or all senders are gone
pub async fn run<T, E>(mut session: GestureSession<T, E>, mut rx: mpsc::UnboundedReceiver<Command>)
where
    T: HubTransport,
    E: EffectSink,
{
    debug!("Session actor started");

    while let Some(command) = rx.recv().await {
        match command {
            Command::Message(message) => session.on_nanoapp_message(&message),
            Command::Aborted { nanoapp_id, code } => {
                session.on_nanoapp_aborted(nanoapp_id, code);
            }
            Command::Enable => {
                let _ = session.enable();
            }
            Command::Disable => {
                let _ = session.disable();
            }
            Command::SetSensitivity { value, reply } => {
                let _ = reply.send(session.set_sensitivity(value));
            }
            Command::Stats(reply) => {
                let _ = reply.send(session.stats());
            }
            Command::Shutdown => break,
        }
    }

    debug!("Session actor stopped");
}
