//! Configuration module for detector and display tuning
//!
//! Reads/writes configuration from ~/.config/sensedeck/config.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Tunables for the monitor. Defaults match the page this reimplements.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Total acceleration (m/s², gravity included) that counts as a shake
    pub shake_threshold: f64,
    /// Minimum gap between two recognized shakes, milliseconds
    pub shake_debounce_ms: u64,
    /// How long the shake icon stays animated, milliseconds
    pub shake_animation_ms: u64,
    /// Simulated compass-calibration delay, milliseconds
    pub calibrate_delay_ms: u64,
    /// How long a toast stays fully visible, milliseconds
    pub toast_display_ms: u64,
    /// Toast exit-animation window, milliseconds
    pub toast_exit_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shake_threshold: 15.0,
            shake_debounce_ms: 1000,
            shake_animation_ms: 500,
            calibrate_delay_ms: 1500,
            toast_display_ms: 3000,
            toast_exit_ms: 300,
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("sensedeck").join("config.toml"))
    }

    /// Load config from file, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            tracing::warn!("Could not determine config directory, using defaults");
            return Self::default();
        };

        if !path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", path);
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {:?}", path);
                    config
                }
                Err(e) => {
                    tracing::error!("Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::error!("Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Save config to file
    pub fn save(&self) -> anyhow::Result<()> {
        let path =
            Self::path().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    pub fn shake_debounce(&self) -> Duration {
        Duration::from_millis(self.shake_debounce_ms)
    }

    pub fn shake_animation(&self) -> Duration {
        Duration::from_millis(self.shake_animation_ms)
    }

    pub fn calibrate_delay(&self) -> Duration {
        Duration::from_millis(self.calibrate_delay_ms)
    }

    pub fn toast_display(&self) -> Duration {
        Duration::from_millis(self.toast_display_ms)
    }

    pub fn toast_exit(&self) -> Duration {
        Duration::from_millis(self.toast_exit_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_detector_constants() {
        let config = Config::default();
        assert_eq!(config.shake_threshold, crate::shake::SHAKE_THRESHOLD);
        assert_eq!(config.shake_debounce(), crate::shake::DEBOUNCE_WINDOW);
        assert_eq!(config.toast_display(), crate::notify::TOAST_DISPLAY);
        assert_eq!(config.toast_exit(), crate::notify::TOAST_EXIT);
    }

    #[test]
    fn partial_file_falls_back_to_defaults_per_field() {
        let config: Config = toml::from_str("shake_threshold = 12.5\n").unwrap();
        assert_eq!(config.shake_threshold, 12.5);
        assert_eq!(config.shake_debounce_ms, 1000);
        assert_eq!(config.calibrate_delay_ms, 1500);
    }

    #[test]
    fn round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.shake_threshold, config.shake_threshold);
        assert_eq!(parsed.toast_display_ms, config.toast_display_ms);
    }
}
