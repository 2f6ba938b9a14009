//! Bridge configuration supplied by the host as a JSON string.
//!
//! ```json
//! { "session": { "sensitivity": 0.5, "progress_report_threshold": 0.5 }, "log_level": "info" }
//! ```
//!
//! Every field is optional; an empty string yields the defaults.

use std::str::FromStr;

use log::LevelFilter;
use serde::Deserialize;
use squeeze_protocol::SessionConfig;

use crate::BridgeError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub session: SessionConfig,
    /// `log` level name: off, error, warn, info, debug or trace
    pub log_level: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl BridgeConfig {
    pub fn from_json(json: &str) -> Result<Self, BridgeError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(json)?)
    }

    /// Parsed log level, falling back to `Info` for unknown names
    pub fn level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(&self.log_level).unwrap_or(LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(BridgeConfig::from_json("").unwrap(), BridgeConfig::default());
        assert_eq!(BridgeConfig::from_json("  ").unwrap(), BridgeConfig::default());
        assert_eq!(BridgeConfig::from_json("{}").unwrap(), BridgeConfig::default());
    }

    #[test]
    fn test_partial_session_config() {
        let config = BridgeConfig::from_json(r#"{"session":{"sensitivity":0.8}}"#).unwrap();
        assert_eq!(config.session.sensitivity, 0.8);
        assert_eq!(config.session.progress_report_threshold, 0.5);
        assert_eq!(config.level_filter(), LevelFilter::Info);
    }

    #[test]
    fn test_log_level() {
        let config = BridgeConfig::from_json(r#"{"log_level":"debug"}"#).unwrap();
        assert_eq!(config.level_filter(), LevelFilter::Debug);

        let config = BridgeConfig::from_json(r#"{"log_level":"chatty"}"#).unwrap();
        assert_eq!(config.level_filter(), LevelFilter::Info);
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(matches!(
            BridgeConfig::from_json("{\"session\":"),
            Err(BridgeError::Json(_))
        ));
    }
}
