//! Configuration management for playback defaults and engine policy
//!
//! This module provides runtime configuration loading from JSON files so
//! fallback timing and device heuristics can be tuned without recompiling.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub device: DeviceConfig,
}

/// Playback defaults and fallback timer parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Duration used by `vibrate_duration` when the caller omits one
    pub default_duration_ms: u64,
    /// Intensity used by `vibrate_duration` when the caller omits one
    pub default_intensity: u8,
    /// Interval between pulses on the fallback path
    pub fallback_tick_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: 500,
            default_intensity: 255,
            fallback_tick_ms: 1000,
        }
    }
}

/// Engine lifecycle policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Restart the engine when the backend reports a reset
    pub auto_restart: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { auto_restart: true }
    }
}

/// Device identity heuristics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Hardware model prefixes known to lack custom haptics (e.g. "iPhone8,")
    pub incapable_model_prefixes: Vec<String>,
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// A missing or malformed file is not an error: the defaults are used and
    /// a warning is logged.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|err| {
                log::warn!(
                    "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }),
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Parse configuration from a JSON string
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        let config: Self = serde_json::from_str(contents)?;
        log::info!("[Config] Loaded configuration");
        Ok(config)
    }

    /// Load configuration from the default asset location
    pub fn load() -> Self {
        Self::load_from_file("assets/vibration_config.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.playback.default_duration_ms, 500);
        assert_eq!(config.playback.default_intensity, 255);
        assert_eq!(config.playback.fallback_tick_ms, 1000);
        assert!(config.engine.auto_restart);
        assert!(config.device.incapable_model_prefixes.is_empty());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config =
            AppConfig::from_json(r#"{"playback": {"fallback_tick_ms": 250}}"#).unwrap();
        assert_eq!(config.playback.fallback_tick_ms, 250);
        assert_eq!(config.playback.default_duration_ms, 500);
        assert!(config.engine.auto_restart);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load_from_file("/nonexistent/vibration_config.json");
        assert_eq!(config.playback.default_intensity, 255);
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(AppConfig::from_json("{ not json").is_err());
    }
}
