//! # brightsync
//!
//! Keep a laptop's backlight in step with a phone, a schedule, or a light sensor.
//!
//! A small HTTP server receives a brightness signal, maps it to a percentage
//! for the laptop panel, and applies it with a short stepped fade:
//!
//! - **Phone brightness** is calibrated across the two panels (lookup table,
//!   perceptual, logarithmic, or linear curve)
//! - **Named levels** (`dim`, `bright`, ...) map to the midpoint of a range
//! - **Time-based** requests pick a level from a time-of-day schedule
//! - **Lux** readings map linearly to a percentage
//!
//! ## Quick Start (axum)
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use brightsync::{server, BrightnessController, Config, SysfsBacklight};
//!
//! let config = Config::load("brightsync.yaml")?;
//! let backend = SysfsBacklight::discover()?;
//! let controller = Arc::new(BrightnessController::new(Box::new(backend) as _, config));
//!
//! let app = server::router(controller);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//! axum::serve(listener, app).await?;
//! ```
//!
//! ## HTTP API
//!
//! | Endpoint | Method | Purpose |
//! |----------|--------|---------|
//! | `/health` | GET | Liveness plus current brightness |
//! | `/brightness` | GET | Current brightness |
//! | `/brightness` | POST | Set brightness from a signal |
//! | `/auto` | POST | Apply the scheduled level |
//! | `/config` | GET | Active configuration |
//!
//! `POST /brightness` accepts one of:
//!
//! ```json
//! {"brightness": 0.42}      // phone fraction, or a percentage above 1
//! {"level": "dim"}
//! {"time_based": true}
//! {"lux": 320}
//! ```
//!
//! plus an optional `"smooth": false` to skip the fade.
//!
//! ## Feature Flags
//!
//! - `axum` - Axum router, handlers and extractors
//! - `cli` - The `brightsync` binary (implies `axum`)
//! - `full` - All features

pub mod auth;
pub mod autostart;
pub mod backend;
pub mod calibration;
pub mod config;
mod controller;
mod error;
pub mod levels;
mod request;
pub mod schedule;
pub mod transition;

pub use auth::TokenAuth;
pub use backend::{BrightnessBackend, MemoryBackend, SysfsBacklight};
pub use calibration::{CurveMode, DisplayCalibration};
pub use config::Config;
pub use controller::BrightnessController;
pub use error::Error;
pub use request::{
    AutoResponse, BrightnessCommand, BrightnessRequest, CurrentBrightnessResponse, ErrorResponse,
    HealthResponse, SetBrightnessResponse,
};

/// Lowest brightness ever written (0 would switch some panels off)
pub const MIN_BRIGHTNESS: u8 = 1;

/// Highest brightness percentage
pub const MAX_BRIGHTNESS: u8 = 100;

/// Fallback when the display cannot be read or a level is unknown
pub const DEFAULT_BRIGHTNESS: u8 = 50;

/// Lux per brightness percent above the base
const LUX_PER_PERCENT: f64 = 50.0;

/// Brightness at 0 lux before clamping
const LUX_BASE_PERCENT: f64 = 20.0;

/// Floor for lux-derived brightness
pub const LUX_MIN_BRIGHTNESS: u8 = 10;

// Re-export axum integration
#[cfg(feature = "axum")]
pub mod server;

/// Convert an ambient light reading to a brightness percentage.
///
/// `lux / 50 + 20`, truncated and clamped to 10..=100.
///
/// # Example
///
/// ```
/// use brightsync::lux_to_percent;
///
/// assert_eq!(lux_to_percent(0.0), 20);
/// assert_eq!(lux_to_percent(1000.0), 40);
/// assert_eq!(lux_to_percent(10_000.0), 100);
/// ```
pub fn lux_to_percent(lux: f64) -> u8 {
    if lux.is_nan() {
        return LUX_MIN_BRIGHTNESS;
    }
    (lux / LUX_PER_PERCENT + LUX_BASE_PERCENT)
        .trunc()
        .clamp(f64::from(LUX_MIN_BRIGHTNESS), f64::from(MAX_BRIGHTNESS)) as u8
}
