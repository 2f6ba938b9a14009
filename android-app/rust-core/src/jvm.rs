//! # JVM-backed Hub and Effects
//!
//! The context hub client, vibrator and screenshot helper live on the Kotlin
//! side. They are reached through a single callbacks object implementing:
//!
//! ```kotlin
//! interface SqueezeCallbacks {
//!     fun connectToHub(): Boolean
//!     fun sendMessageToNanoApp(nanoappId: Long, messageType: Int, body: ByteArray): Int
//!     fun vibrate(effectId: Int)
//!     fun takeScreenshot(screenshotType: Int, source: Int)
//! }
//! ```
//!
//! Calls may arrive from the session actor thread, which is attached to the
//! VM on first use.

use std::sync::Arc;

use jni::objects::{GlobalRef, JObject, JValue};
use jni::{JNIEnv, JavaVM};
use log::error;
use squeeze_protocol::channel::{ConnectError, ContextHub, HubTransport, NanoAppMessage};
use squeeze_protocol::effects::{EffectSink, Haptic, ScreenshotRegion, ScreenshotRequest, ScreenshotSource};

use crate::BridgeError;

/// `VibrationEffect.EFFECT_CLICK`
const EFFECT_CLICK: i32 = 0;
/// `VibrationEffect.EFFECT_HEAVY_CLICK`
const EFFECT_HEAVY_CLICK: i32 = 5;
/// `WindowManager.TAKE_SCREENSHOT_FULLSCREEN`
const TAKE_SCREENSHOT_FULLSCREEN: i32 = 1;
/// `WindowManager.ScreenshotSource.SCREENSHOT_OTHER`
const SCREENSHOT_OTHER: i32 = 5;

/// Local references a single callback may hold at once
const LOCAL_FRAME_CAPACITY: i32 = 4;

/// Status reported when the Java send call itself failed
pub const JNI_CALL_FAILED: i32 = -1;

/// Handle to the Kotlin callbacks object
#[derive(Clone)]
pub struct JvmCallbacks {
    vm: Arc<JavaVM>,
    callbacks: GlobalRef,
}

impl JvmCallbacks {
    pub fn new(env: &mut JNIEnv, callbacks: &JObject) -> Result<Self, BridgeError> {
        if callbacks.is_null() {
            return Err(BridgeError::NullCallbacks);
        }
        Ok(Self {
            vm: Arc::new(env.get_java_vm()?),
            callbacks: env.new_global_ref(callbacks)?,
        })
    }

    /// Run `f` inside a local frame on the current thread, clearing any Java
    /// exception
    ///
    /// The actor thread is attached permanently and never returns to Java, so
    /// local references created by `f` are only released when the frame pops.
    fn with_env<R>(
        &self,
        f: impl FnOnce(&mut JNIEnv, &JObject) -> jni::errors::Result<R>,
    ) -> jni::errors::Result<R> {
        let mut env = self.vm.attach_current_thread_permanently()?;
        let callbacks = self.callbacks.as_obj();
        let result = env.with_local_frame(LOCAL_FRAME_CAPACITY, |env| f(env, callbacks));

        if env.exception_check()? {
            env.exception_describe()?;
            env.exception_clear()?;
        }
        result
    }
}

/// Hub discovery through `connectToHub`
pub struct JvmHub(pub JvmCallbacks);

impl ContextHub for JvmHub {
    type Transport = JvmTransport;

    fn create_client(&mut self) -> Result<JvmTransport, ConnectError> {
        let connected = self
            .0
            .with_env(|env, callbacks| env.call_method(callbacks, "connectToHub", "()Z", &[])?.z())
            .map_err(|e| ConnectError::ClientRejected(e.to_string()))?;

        if connected {
            Ok(JvmTransport(self.0.clone()))
        } else {
            Err(ConnectError::NoHub)
        }
    }
}

/// Outbound messages through `sendMessageToNanoApp`
pub struct JvmTransport(JvmCallbacks);

impl HubTransport for JvmTransport {
    fn send_message(&mut self, message: &NanoAppMessage) -> i32 {
        let result = self.0.with_env(|env, callbacks| {
            let body = env.byte_array_from_slice(&message.body)?;
            env.call_method(
                callbacks,
                "sendMessageToNanoApp",
                "(JI[B)I",
                &[
                    JValue::Long(message.nanoapp_id as i64),
                    JValue::Int(message.message_type as i32),
                    JValue::Object(&*body),
                ],
            )?
            .i()
        });

        result.unwrap_or_else(|e| {
            error!("sendMessageToNanoApp failed: {}", e);
            JNI_CALL_FAILED
        })
    }
}

/// Haptics and screenshots through `vibrate` and `takeScreenshot`
pub struct JvmEffects(pub JvmCallbacks);

impl EffectSink for JvmEffects {
    fn vibrate(&mut self, haptic: Haptic) {
        let effect = match haptic {
            Haptic::Light => EFFECT_CLICK,
            Haptic::Heavy => EFFECT_HEAVY_CLICK,
        };

        let result = self.0.with_env(|env, callbacks| {
            env.call_method(callbacks, "vibrate", "(I)V", &[JValue::Int(effect)])?
                .v()
        });
        if let Err(e) = result {
            error!("vibrate({:?}) failed: {}", haptic, e);
        }
    }

    fn capture_screenshot(&mut self, request: ScreenshotRequest) {
        let screenshot_type = match request.region {
            ScreenshotRegion::Fullscreen => TAKE_SCREENSHOT_FULLSCREEN,
        };
        let source = match request.source {
            ScreenshotSource::Other => SCREENSHOT_OTHER,
        };

        let result = self.0.with_env(|env, callbacks| {
            env.call_method(
                callbacks,
                "takeScreenshot",
                "(II)V",
                &[JValue::Int(screenshot_type), JValue::Int(source)],
            )?
            .v()
        });
        if let Err(e) = result {
            error!("takeScreenshot failed: {}", e);
        }
    }
}
