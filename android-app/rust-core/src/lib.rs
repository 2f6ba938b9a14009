//! # Android JNI Rust Core Library
//!
//! This library provides the native backend for the SystemUI squeeze service.
//! It handles:
//!
//! - Routing context hub messages from the squeeze nanoapp into the session
//! - Pushing recognizer start/stop and sensitivity changes to the nanoapp
//! - Dispatching haptics and screenshots back to the host
//!
//! ## JNI Bridge Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     SystemUI (Kotlin)                           │
//! │                                                                 │
//! │  ┌──────────────────────┐     ┌──────────────────────────────┐  │
//! │  │ ContextHubClient     │────►│  SqueezeBridge (externals)   │  │
//! │  │ Callback             │     └──────────────────────────────┘  │
//! │  └──────────────────────┘                   │                   │
//! │             ▲                               │ JNI Calls         │
//! │             │ SqueezeCallbacks              ▼                   │
//! │  ┌──────────────────────────────────────────────────────────┐  │
//! │  │                  squeeze_core (this lib)                  │  │
//! │  │                                                           │  │
//! │  │  ┌─────────────┐  ┌──────────────┐  ┌─────────────────┐   │  │
//! │  │  │ JVM hub /   │◄─│ SessionActor │─►│ GestureSession  │   │  │
//! │  │  │ effects     │  │  (tokio)     │  │  (protocol)     │   │  │
//! │  │  └─────────────┘  └──────────────┘  └─────────────────┘   │  │
//! │  └──────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## JNI Functions Exported
//!
//! - `Java_com_android_systemui_squeeze_SqueezeBridge_nativeStart`: Connect and enable
//! - `Java_com_android_systemui_squeeze_SqueezeBridge_nativeStop`: Disable and tear down
//! - `Java_com_android_systemui_squeeze_SqueezeBridge_nativeOnMessageFromNanoApp`: Inbound message
//! - `Java_com_android_systemui_squeeze_SqueezeBridge_nativeOnNanoAppAborted`: Abort notification
//! - `Java_com_android_systemui_squeeze_SqueezeBridge_nativeEnable`: Start the recognizer
//! - `Java_com_android_systemui_squeeze_SqueezeBridge_nativeDisable`: Stop the recognizer
//! - `Java_com_android_systemui_squeeze_SqueezeBridge_nativeSetSensitivity`: Push sensitivity
//! - `Java_com_android_systemui_squeeze_SqueezeBridge_nativeGetStats`: Session statistics

pub mod actor;
pub mod config;
pub mod jvm;

use std::sync::{Mutex, Once, PoisonError};

use jni::objects::{JByteArray, JClass, JObject, JString};
use jni::sys::{jboolean, jfloat, jint, jlong, jstring, JNI_FALSE, JNI_TRUE};
use jni::JNIEnv;
use lazy_static::lazy_static;
use log::{debug, error, info, warn};
use thiserror::Error;

use squeeze_protocol::channel::NanoAppMessage;
use squeeze_protocol::session::{GestureSession, SessionError};
use squeeze_protocol::NANOAPP_ID;

use crate::actor::SessionActor;
use crate::config::BridgeConfig;
use crate::jvm::{JvmCallbacks, JvmEffects, JvmHub};

// Initialize logging once
static INIT_LOGGER: Once = Once::new();

/// Errors that can occur in the JNI bridge
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Squeeze bridge not started")]
    NotStarted,
    #[error("Squeeze bridge already started")]
    AlreadyStarted,
    #[error("Callbacks object is null")]
    NullCallbacks,
    #[error("Session actor stopped")]
    SessionClosed,
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("JNI error: {0}")]
    Jni(#[from] jni::errors::Error),
    #[error("Failed to spawn session actor: {0}")]
    Spawn(#[from] std::io::Error),
}

lazy_static! {
    static ref BRIDGE: Mutex<Option<SessionActor>> = Mutex::new(None);
}

/// Run `f` against the running session actor
fn with_bridge<R>(f: impl FnOnce(&SessionActor) -> Result<R, BridgeError>) -> Result<R, BridgeError> {
    let bridge = BRIDGE.lock().unwrap_or_else(PoisonError::into_inner);
    match bridge.as_ref() {
        Some(actor) => f(actor),
        None => Err(BridgeError::NotStarted),
    }
}

fn to_jboolean<T>(result: Result<T, BridgeError>, what: &str) -> jboolean {
    match result {
        Ok(_) => JNI_TRUE,
        Err(e) => {
            error!("{} failed: {}", what, e);
            JNI_FALSE
        }
    }
}

fn init_logger(config: &BridgeConfig) {
    INIT_LOGGER.call_once(|| {
        android_logger::init_once(
            android_logger::Config::default()
                .with_max_level(config.level_filter())
                .with_tag("SqueezeCore"),
        );
    });
}

fn read_config(env: &mut JNIEnv, config_json: &JString) -> Result<BridgeConfig, BridgeError> {
    if config_json.is_null() {
        return Ok(BridgeConfig::default());
    }
    let json: String = env.get_string(config_json)?.into();
    BridgeConfig::from_json(&json)
}

fn start(env: &mut JNIEnv, callbacks: &JObject, config: BridgeConfig) -> Result<(), BridgeError> {
    let mut bridge = BRIDGE.lock().unwrap_or_else(PoisonError::into_inner);
    if bridge.is_some() {
        return Err(BridgeError::AlreadyStarted);
    }

    let callbacks = JvmCallbacks::new(env, callbacks)?;
    let mut hub = JvmHub(callbacks.clone());
    let session = GestureSession::start(&mut hub, NANOAPP_ID, JvmEffects(callbacks), config.session)?;

    *bridge = Some(SessionActor::spawn(session)?);
    Ok(())
}

/// Connect to the context hub and enable the recognizer
///
/// Called from Kotlin:
/// ```kotlin
/// external fun nativeStart(callbacks: SqueezeCallbacks, configJson: String?): Boolean
/// ```
#[no_mangle]
pub extern "system" fn Java_com_android_systemui_squeeze_SqueezeBridge_nativeStart(
    mut env: JNIEnv,
    _class: JClass,
    callbacks: JObject,
    config_json: JString,
) -> jboolean {
    let config = read_config(&mut env, &config_json);
    init_logger(config.as_ref().unwrap_or(&BridgeConfig::default()));

    let config = config.unwrap_or_else(|e| {
        warn!("Ignoring bridge configuration: {}", e);
        BridgeConfig::default()
    });
    info!("Squeeze core {} starting", squeeze_protocol::VERSION);

    to_jboolean(start(&mut env, &callbacks, config), "Start")
}

/// Disable the recognizer and stop the session actor
///
/// Called from Kotlin:
/// ```kotlin
/// external fun nativeStop()
/// ```
#[no_mangle]
pub extern "system" fn Java_com_android_systemui_squeeze_SqueezeBridge_nativeStop(
    _env: JNIEnv,
    _class: JClass,
) {
    let actor = BRIDGE.lock().unwrap_or_else(PoisonError::into_inner).take();
    match actor {
        Some(actor) => {
            let _ = actor.disable();
            drop(actor);
            info!("Squeeze bridge stopped");
        }
        None => debug!("nativeStop called but bridge not started"),
    }
}

/// Deliver a message received by the context hub client
///
/// Called from Kotlin:
/// ```kotlin
/// external fun nativeOnMessageFromNanoApp(nanoappId: Long, messageType: Int, body: ByteArray?)
/// ```
#[no_mangle]
pub extern "system" fn Java_com_android_systemui_squeeze_SqueezeBridge_nativeOnMessageFromNanoApp(
    mut env: JNIEnv,
    _class: JClass,
    nanoapp_id: jlong,
    message_type: jint,
    body: JByteArray,
) {
    let body = if body.is_null() {
        Vec::new()
    } else {
        match env.convert_byte_array(&body) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Failed to copy message body: {:?}", e);
                return;
            }
        }
    };

    let message = NanoAppMessage {
        nanoapp_id: nanoapp_id as u64,
        message_type: message_type as u32,
        body,
    };
    if let Err(e) = with_bridge(|actor| actor.on_message(message)) {
        warn!("Dropping nanoapp message: {}", e);
    }
}

/// Deliver a nanoapp abort notification
///
/// Called from Kotlin:
/// ```kotlin
/// external fun nativeOnNanoAppAborted(nanoappId: Long, error: Int)
/// ```
#[no_mangle]
pub extern "system" fn Java_com_android_systemui_squeeze_SqueezeBridge_nativeOnNanoAppAborted(
    _env: JNIEnv,
    _class: JClass,
    nanoapp_id: jlong,
    error: jint,
) {
    if let Err(e) = with_bridge(|actor| actor.on_aborted(nanoapp_id as u64, error)) {
        warn!("Dropping abort notification: {}", e);
    }
}

/// Called from Kotlin:
/// ```kotlin
/// external fun nativeEnable(): Boolean
/// ```
#[no_mangle]
pub extern "system" fn Java_com_android_systemui_squeeze_SqueezeBridge_nativeEnable(
    _env: JNIEnv,
    _class: JClass,
) -> jboolean {
    to_jboolean(with_bridge(SessionActor::enable), "Enable")
}

/// Called from Kotlin:
/// ```kotlin
/// external fun nativeDisable(): Boolean
/// ```
#[no_mangle]
pub extern "system" fn Java_com_android_systemui_squeeze_SqueezeBridge_nativeDisable(
    _env: JNIEnv,
    _class: JClass,
) -> jboolean {
    to_jboolean(with_bridge(SessionActor::disable), "Disable")
}

/// Store a new sensitivity and push it to the nanoapp
///
/// Returns false when the value was rejected or the hub refused the update.
///
/// Called from Kotlin:
/// ```kotlin
/// external fun nativeSetSensitivity(value: Float): Boolean
/// ```
#[no_mangle]
pub extern "system" fn Java_com_android_systemui_squeeze_SqueezeBridge_nativeSetSensitivity(
    _env: JNIEnv,
    _class: JClass,
    value: jfloat,
) -> jboolean {
    let result = with_bridge(|actor| actor.set_sensitivity(value));
    if let Ok(applied) = &result {
        debug!("Sensitivity set to {}", applied);
    }
    to_jboolean(result, "Set sensitivity")
}

/// Get session statistics as JSON
///
/// Called from Kotlin:
/// ```kotlin
/// external fun nativeGetStats(): String?
/// ```
#[no_mangle]
pub extern "system" fn Java_com_android_systemui_squeeze_SqueezeBridge_nativeGetStats(
    mut env: JNIEnv,
    _class: JClass,
) -> jstring {
    let stats_json = with_bridge(|actor| Ok(serde_json::to_string(&actor.stats()?)?));

    let stats_json = match stats_json {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to collect stats: {}", e);
            return std::ptr::null_mut();
        }
    };

    match env.new_string(&stats_json) {
        Ok(s) => s.into_raw(),
        Err(e) => {
            error!("Failed to create stats string: {:?}", e);
            std::ptr::null_mut()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_not_started() {
        assert!(matches!(
            with_bridge(SessionActor::enable),
            Err(BridgeError::NotStarted)
        ));
    }

    #[test]
    fn test_bridge_error_messages() {
        assert_eq!(BridgeError::SessionClosed.to_string(), "Session actor stopped");
        let err = BridgeError::from(SessionError::Send(
            squeeze_protocol::SendError::Rejected(-2),
        ));
        assert_eq!(err.to_string(), "Message rejected by context hub: -2");
    }
}
