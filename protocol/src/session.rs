//! # Gesture Session
//!
//! Debounces the nanoapp's noisy progress signal into discrete effects and
//! pushes configuration back down to the recognizer.
//!
//! ## State Machine
//!
//! ```text
//!                 progress in [0.5, 0.99]
//!                   / vibrate(Light)
//!        ┌──────┐ ─────────────────────────► ┌───────┐
//!        │ Idle │                            │ Armed │ ◄── progress in window
//!        └──────┘ ◄───────────────────────── └───────┘     (no effect)
//!                 progress outside window
//!                 or GestureDetected
//! ```
//!
//! `GestureDetected` always requests a screenshot followed by a heavy haptic,
//! whatever the previous state.
//!
//! The session takes `&mut self` everywhere; hosts that deliver messages
//! from several threads must serialize access (see the core crate's actor).

use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::channel::{
    AbortNotification, Channel, ChannelStats, ConnectError, ContextHub, HubTransport,
    NanoAppMessage, SendError,
};
use crate::codec::Message;
use crate::config::{normalize_sensitivity, ConfigError, SessionConfig};
use crate::effects::{EffectSink, Haptic, ScreenshotRequest};
use crate::payload::{GestureDetected, RecognizerStart, SensitivityUpdate};

/// Lower bound of the progress window
pub const PROGRESS_WINDOW_START: f32 = 0.5;

/// Upper bound of the progress window
pub const PROGRESS_WINDOW_END: f32 = 0.99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureState {
    /// No squeeze in progress
    Idle,
    /// Progress window entered since the last exit or detection
    Armed,
}

/// Errors surfaced by session operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Connect(#[from] ConnectError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Send(#[from] SendError),
}

/// Snapshot of session state and channel counters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SessionStats {
    pub state: GestureState,
    pub sensitivity: f32,
    pub gestures_detected: u64,
    pub channel: ChannelStats,
}

/// Squeeze gesture session bound to one nanoapp channel
pub struct GestureSession<T, E> {
    channel: Channel<T>,
    effects: E,
    config: SessionConfig,
    armed: bool,
    gestures_detected: u64,
}

impl<T: HubTransport, E: EffectSink> GestureSession<T, E> {
    /// Create a session over an open channel
    pub fn new(
        channel: Channel<T>,
        effects: E,
        config: SessionConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            channel,
            effects,
            config: config.validate()?,
            armed: false,
            gestures_detected: 0,
        })
    }

    /// Connect to the hub and start the recognizer
    ///
    /// Failing to reach the hub is fatal. A rejected `RecognizerStart` is
    /// logged and the session is returned anyway.
    pub fn start<H>(
        hub: &mut H,
        endpoint: u64,
        effects: E,
        config: SessionConfig,
    ) -> Result<Self, SessionError>
    where
        H: ContextHub<Transport = T>,
    {
        info!("Initializing squeeze gesture");

        let channel = Channel::connect(hub, endpoint)?;
        let mut session = Self::new(channel, effects, config)?;
        let _ = session.enable();
        Ok(session)
    }

    pub fn state(&self) -> GestureState {
        if self.armed {
            GestureState::Armed
        } else {
            GestureState::Idle
        }
    }

    pub fn sensitivity(&self) -> f32 {
        self.config.sensitivity
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn channel(&self) -> &Channel<T> {
        &self.channel
    }

    pub fn effects(&self) -> &E {
        &self.effects
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            state: self.state(),
            sensitivity: self.config.sensitivity,
            gestures_detected: self.gestures_detected,
            channel: self.channel.stats(),
        }
    }

    /// Entry point for raw messages delivered by the hub client
    pub fn on_nanoapp_message(&mut self, message: &NanoAppMessage) {
        if let Some(decoded) = self.channel.receive(message) {
            self.handle(decoded);
        }
    }

    /// Entry point for abort notifications; never changes gesture state
    pub fn on_nanoapp_aborted(
        &mut self,
        nanoapp_id: u64,
        code: i32,
    ) -> Option<AbortNotification> {
        self.channel.on_aborted(nanoapp_id, code)
    }

    /// Apply one decoded inbound message
    pub fn handle(&mut self, message: Message) {
        match message {
            Message::GestureProgress(msg) => self.on_progress(msg.progress),
            Message::GestureDetected(msg) => self.on_detected(msg),

            // Debugging dumps we never request
            Message::SnapshotResponse(snapshot) => {
                warn!("Received unsolicited snapshot response {}", snapshot);
            }
            Message::ChassisResponse(chassis) => {
                warn!("Received unsolicited chassis response {}", chassis);
            }

            other => {
                let (ty, body) = other.encode();
                warn!("Received unexpected message of type {}: {:02x?}", ty, body);
            }
        }
    }

    fn on_progress(&mut self, progress: f32) {
        // NaN counts as outside the window
        if progress < PROGRESS_WINDOW_START
            || progress > PROGRESS_WINDOW_END
            || progress.is_nan()
        {
            self.armed = false;
        } else if !self.armed {
            debug!("Entered squeeze at progress {}", progress);
            self.armed = true;
            self.effects.vibrate(Haptic::Light);
        }
    }

    fn on_detected(&mut self, msg: GestureDetected) {
        info!(
            "Gesture detected host_suspended={} haptic_consumed={}",
            msg.host_suspended, msg.haptic_consumed
        );

        self.gestures_detected += 1;
        self.effects.capture_screenshot(ScreenshotRequest::FULLSCREEN);
        self.effects.vibrate(Haptic::Heavy);
        self.armed = false;
    }

    /// Start the recognizer with the current sensitivity
    pub fn enable(&mut self) -> Result<(), SendError> {
        info!("Enabling squeeze recognizer (sensitivity {})", self.config.sensitivity);

        self.channel
            .send_message(&Message::RecognizerStart(RecognizerStart {
                progress_report_threshold: self.config.progress_report_threshold,
                sensitivity: self.config.sensitivity,
            }))
    }

    /// Stop the recognizer
    pub fn disable(&mut self) -> Result<(), SendError> {
        info!("Disabling squeeze recognizer");
        self.channel.send_message(&Message::RecognizerStop)
    }

    /// Store a new sensitivity and push it to the nanoapp
    ///
    /// Returns the value actually stored and sent after the sensitivity
    /// policy is applied. A rejected push leaves the new value stored.
    pub fn set_sensitivity(&mut self, value: f32) -> Result<f32, SessionError> {
        let sensitivity = normalize_sensitivity(value)?;
        self.config.sensitivity = sensitivity;

        self.channel
            .send_message(&Message::SensitivityUpdate(SensitivityUpdate { sensitivity }))?;
        Ok(sensitivity)
    }
}
