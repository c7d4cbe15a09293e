//! HTTP payload types.
//!
//! These match what the iOS Shortcuts automation sends and expects back.

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;

/// What a brightness request asks for, after validation.
#[derive(Debug, Clone, PartialEq)]
pub enum BrightnessCommand {
    /// Phone brightness, already normalized to a fraction
    Calibrated(f64),
    /// Named level
    Level(String),
    /// Whatever the schedule says right now
    TimeBased,
    /// Ambient light reading in lux
    Lux(f64),
}

/// Body of `POST /brightness`.
///
/// Exactly one signal is used, in priority order `brightness`, `level`,
/// `time_based`, `lux`.
///
/// # Example
///
/// ```
/// use brightsync::{BrightnessCommand, BrightnessRequest};
///
/// let request = BrightnessRequest::from_json(serde_json::json!({
///     "brightness": "45",
///     "smooth": false,
/// }))
/// .unwrap();
///
/// assert_eq!(request.command, BrightnessCommand::Calibrated(0.45));
/// assert!(!request.smooth);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BrightnessRequest {
    /// Validated signal
    pub command: BrightnessCommand,
    /// Whether to step towards the target (default true)
    pub smooth: bool,
}

impl BrightnessRequest {
    /// Interpret a JSON body.
    ///
    /// Any empty body (`null`, `{}`, `[]`, `""`, `0`, `false`) counts as no
    /// data. Shortcuts sometimes wraps the whole dictionary under an empty key
    /// (`{"": {...}}`); that wrapper is removed first.
    pub fn from_json(body: Value) -> Result<Self, Error> {
        if !is_truthy(&body) {
            return Err(Error::InvalidRequest("No JSON data provided".to_string()));
        }
        let Value::Object(mut body) = body else {
            return Err(Error::InvalidRequest("Invalid brightness data".to_string()));
        };

        if let Some(Value::Object(inner)) = body.remove("") {
            tracing::info!("Unwrapping Shortcuts payload: {:?}", inner);
            body = inner;
        }

        let smooth = body.get("smooth").map(is_truthy).unwrap_or(true);

        let command = if let Some(value) = body.get("brightness") {
            let raw = match value {
                Value::Number(n) => n.as_f64(),
                Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
                Value::String(s) => Some(s.trim().parse::<f64>().map_err(|_| {
                    Error::InvalidRequest("Invalid brightness value".to_string())
                })?),
                _ => None,
            };
            raw.filter(|v| v.is_finite())
                .map(|v| BrightnessCommand::Calibrated(crate::calibration::normalize_source(v)))
        } else if let Some(level) = body.get("level") {
            level
                .as_str()
                .map(|s| BrightnessCommand::Level(s.to_lowercase()))
        } else if body.get("time_based").is_some_and(is_truthy) {
            Some(BrightnessCommand::TimeBased)
        } else if let Some(lux) = body.get("lux") {
            lux.as_f64().map(BrightnessCommand::Lux)
        } else {
            None
        };

        command
            .map(|command| Self { command, smooth })
            .ok_or_else(|| Error::InvalidRequest("Invalid brightness data".to_string()))
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Current local time as an ISO 8601 string.
pub fn timestamp() -> String {
    Local::now().to_rfc3339()
}

/// Response for `POST /brightness`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetBrightnessResponse {
    /// Always "success"
    pub status: String,
    /// Percentage that was applied
    pub brightness_set: u8,
    /// Percentage before the change
    pub previous_brightness: u8,
    /// ISO 8601 local time
    pub timestamp: String,
}

impl SetBrightnessResponse {
    /// Create a success response.
    pub fn new(brightness_set: u8, previous_brightness: u8) -> Self {
        Self {
            status: "success".to_string(),
            brightness_set,
            previous_brightness,
            timestamp: timestamp(),
        }
    }
}

/// Response for `POST /auto`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoResponse {
    /// Always "success"
    pub status: String,
    /// Percentage that was applied
    pub brightness_set: u8,
    /// Always "time_based"
    pub mode: String,
    /// ISO 8601 local time
    pub timestamp: String,
}

impl AutoResponse {
    /// Create a success response.
    pub fn new(brightness_set: u8) -> Self {
        Self {
            status: "success".to_string(),
            brightness_set,
            mode: "time_based".to_string(),
            timestamp: timestamp(),
        }
    }
}

/// Response for `GET /brightness`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentBrightnessResponse {
    /// Brightness reported by the display
    pub current_brightness: u8,
    /// ISO 8601 local time
    pub timestamp: String,
}

impl CurrentBrightnessResponse {
    /// Create a response.
    pub fn new(current_brightness: u8) -> Self {
        Self {
            current_brightness,
            timestamp: timestamp(),
        }
    }
}

/// Response for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "ok"
    pub status: String,
    /// ISO 8601 local time
    pub timestamp: String,
    /// Brightness reported by the display
    pub current_brightness: u8,
}

impl HealthResponse {
    /// Create a response.
    pub fn ok(current_brightness: u8) -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: timestamp(),
            current_brightness,
        }
    }
}

/// Error body returned with any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error
    pub error: String,
}

impl ErrorResponse {
    /// Create an error body.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
