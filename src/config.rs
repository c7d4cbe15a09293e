//! Server configuration.
//!
//! Loaded from YAML. Every key is optional; anything left out keeps the value
//! shown below.
//!
//! ```yaml
//! host: "0.0.0.0"
//! port: 5000
//!
//! calibration:
//!   source_max_nits: 625   # iPhone XR
//!   target_max_nits: 300   # AUO B156HAN15.H
//!   source_gamma: 2.2
//!   target_gamma: 2.2
//!   curve: lut             # lut, perceptual, logarithmic, linear
//!   min_brightness: 5
//!   max_brightness: 95
//!   lut:
//!     - [0.0, 0.05]
//!     - [0.5, 0.68]
//!     - [1.0, 0.95]
//!
//! levels:
//!   dim: { min: 30, max: 50 }
//!   normal: { min: 50, max: 70 }
//!
//! schedule:
//!   windows:
//!     - { name: night, start: "22:00", end: "06:00", level: very_dark }
//!
//! transition:
//!   smooth: true
//!   steps: 10
//!   delay_ms: 100
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::calibration::DisplayCalibration;
use crate::levels::Levels;
use crate::schedule::BrightnessSchedule;
use crate::transition::TransitionConfig;
use crate::Error;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 5000;

/// Complete brightsync configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address to bind the HTTP server to
    pub host: String,
    /// Port to bind the HTTP server to
    pub port: u16,
    /// Phone-to-laptop calibration
    pub calibration: DisplayCalibration,
    /// Named brightness levels
    pub levels: Levels,
    /// Time-of-day level schedule
    pub schedule: BrightnessSchedule,
    /// Stepped transition settings
    pub transition: TransitionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            calibration: DisplayCalibration::default(),
            levels: Levels::default(),
            schedule: BrightnessSchedule::default(),
            transition: TransitionConfig::default(),
        }
    }
}

impl Config {
    /// Load and validate configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_yaml(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.as_ref().display(), msg)),
            other => other,
        })
    }

    /// Parse and validate configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, Error> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::Config(format!("Invalid config YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Cross-check every section.
    pub fn validate(&self) -> Result<(), Error> {
        self.calibration.validate()?;
        self.levels.validate()?;
        self.schedule.validate(&self.levels)?;
        Ok(())
    }

    /// `host:port` string for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CurveMode;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.transition.steps, 10);
    }

    #[test]
    fn test_empty_yaml_gives_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_override() {
        let yaml = r#"
port: 8080
calibration:
  curve: perceptual
  max_brightness: 80
transition:
  delay_ms: 0
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.calibration.curve, CurveMode::Perceptual);
        assert_eq!(config.calibration.max_brightness, 80);
        assert_eq!(config.calibration.min_brightness, 5);
        assert_eq!(config.transition.delay_ms, 0);
        assert_eq!(config.transition.steps, 10);
    }

    #[test]
    fn test_invalid_lut_is_rejected() {
        let yaml = r#"
calibration:
  lut:
    - [0.5, 0.5]
    - [0.2, 0.7]
"#;
        assert!(matches!(Config::from_yaml(yaml), Err(Error::Config(_))));
    }

    #[test]
    fn test_schedule_must_reference_known_levels() {
        let yaml = r#"
levels:
  low: { min: 10, max: 20 }
  normal: { min: 40, max: 60 }
schedule:
  windows:
    - { name: night, start: "22:00", end: "06:00", level: very_dark }
"#;
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("very_dark"));
    }

    #[test]
    fn test_json_round_trip_of_defaults() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(json["port"], 5000);
        assert_eq!(json["calibration"]["curve"], "lut");
        assert_eq!(json["calibration"]["lut"][0][1], 0.05);
        assert_eq!(json["levels"]["dim"]["max"], 50);

        let back: Config = serde_json::from_value(json).unwrap();
        assert_eq!(back, Config::default());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/brightsync.yaml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/brightsync.yaml"));
    }
}
