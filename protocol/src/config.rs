//! # Session Configuration
//!
//! Values the host can tune. Sensitivity follows an explicit policy:
//!
//! - non-finite values are rejected and nothing is sent to the nanoapp
//! - finite values outside [0, 1] are clamped into range with a warning
//!
//! The progress report threshold is validated strictly; it is only read when
//! the recognizer starts.

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default squeeze sensitivity
pub const DEFAULT_SENSITIVITY: f32 = 0.5;

/// Progress above which the nanoapp reports `GestureProgress`
pub const DEFAULT_PROGRESS_REPORT_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("sensitivity must be finite, got {0}")]
    NotFinite(f32),
    #[error("progress report threshold must be within [0, 1], got {0}")]
    ThresholdOutOfRange(f32),
}

/// Tunables owned by the gesture session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Squeeze sensitivity in [0, 1]
    pub sensitivity: f32,
    /// Threshold sent with `RecognizerStart`
    pub progress_report_threshold: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sensitivity: DEFAULT_SENSITIVITY,
            progress_report_threshold: DEFAULT_PROGRESS_REPORT_THRESHOLD,
        }
    }
}

impl SessionConfig {
    /// Apply the sensitivity policy and check the threshold
    pub fn validate(self) -> Result<Self, ConfigError> {
        let threshold = self.progress_report_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::ThresholdOutOfRange(threshold));
        }

        Ok(Self {
            sensitivity: normalize_sensitivity(self.sensitivity)?,
            progress_report_threshold: threshold,
        })
    }
}

/// Reject non-finite sensitivities and clamp the rest into [0, 1]
pub fn normalize_sensitivity(value: f32) -> Result<f32, ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite(value));
    }

    let clamped = value.clamp(0.0, 1.0);
    if clamped != value {
        warn!("Sensitivity {} out of range, clamped to {}", value, clamped);
    }
    Ok(clamped)
}
