//! Brightness controller.
//!
//! Ties the configuration to a backend: resolves incoming signals to target
//! percentages and applies them, stepping when asked to.

use std::sync::Mutex;

use crate::backend::BrightnessBackend;
use crate::config::Config;
use crate::request::BrightnessCommand;
use crate::{lux_to_percent, transition, Error, DEFAULT_BRIGHTNESS, MAX_BRIGHTNESS, MIN_BRIGHTNESS};

/// Maps brightness signals to percentages and applies them to a display.
///
/// # Example
///
/// ```
/// use brightsync::{BrightnessController, Config, MemoryBackend};
///
/// let mut config = Config::default();
/// config.transition.delay_ms = 0;
/// let controller = BrightnessController::new(MemoryBackend::new(30), config);
///
/// let target = controller.calibrate(0.5);
/// controller.set_brightness(target, true).unwrap();
/// assert_eq!(controller.current_brightness(), 68);
/// ```
pub struct BrightnessController<B = Box<dyn BrightnessBackend>> {
    config: Config,
    current: Mutex<u8>,
    backend: B,
}

impl<B: BrightnessBackend> BrightnessController<B> {
    /// Create a controller, reading the display's starting brightness.
    pub fn new(backend: B, config: Config) -> Self {
        let initial = read_or_default(&backend);
        tracing::info!(
            "Current brightness: {}% (backend: {})",
            initial,
            backend.name()
        );

        Self {
            config,
            current: Mutex::new(initial),
            backend,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The backend in use.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Brightness as reported by the display, or 50% if it cannot be read.
    pub fn current_brightness(&self) -> u8 {
        read_or_default(&self.backend)
    }

    /// The last value this controller applied (or read at startup).
    pub fn last_applied(&self) -> u8 {
        self.current.lock().map(|v| *v).unwrap_or(DEFAULT_BRIGHTNESS)
    }

    /// Apply a brightness percentage, clamped to `[1,100]`.
    ///
    /// Steps towards the target when `smooth` is set and transitions are
    /// enabled in the configuration. Blocks for the length of the transition.
    pub fn set_brightness(&self, target: u8, smooth: bool) -> Result<u8, Error> {
        let target = target.clamp(MIN_BRIGHTNESS, MAX_BRIGHTNESS);

        let result = if smooth && self.config.transition.smooth {
            let current = self.current_brightness();
            transition::run(&self.backend, current, target, &self.config.transition)
        } else {
            self.backend.set_brightness(target)
        };

        match result {
            Ok(()) => {
                if let Ok(mut current) = self.current.lock() {
                    *current = target;
                }
                tracing::info!("Brightness set to: {}%", target);
                Ok(target)
            }
            Err(e) => {
                tracing::error!("Error setting brightness: {}", e);
                Err(e)
            }
        }
    }

    /// Midpoint brightness of a named level (50% if unknown).
    pub fn brightness_for_level(&self, level: &str) -> u8 {
        self.config.levels.brightness_for(level)
    }

    /// Calibrated laptop brightness for a phone brightness fraction.
    pub fn calibrate(&self, source: f64) -> u8 {
        self.config.calibration.calibrate(source)
    }

    /// Brightness the schedule prescribes right now.
    pub fn time_based_brightness(&self) -> u8 {
        self.config.schedule.current_brightness(&self.config.levels)
    }

    /// Target percentage for a request command.
    pub fn resolve(&self, command: &BrightnessCommand) -> u8 {
        match command {
            BrightnessCommand::Calibrated(fraction) => self.calibrate(*fraction),
            BrightnessCommand::Level(level) => self.brightness_for_level(level),
            BrightnessCommand::TimeBased => self.time_based_brightness(),
            BrightnessCommand::Lux(lux) => lux_to_percent(*lux),
        }
    }

    /// Apply the scheduled level.
    pub fn apply_time_based(&self) -> Result<u8, Error> {
        let target = self.time_based_brightness();
        self.set_brightness(target, true)
    }
}

fn read_or_default<B: BrightnessBackend + ?Sized>(backend: &B) -> u8 {
    match backend.get_brightness() {
        Ok(value) => value,
        Err(e) => {
            tracing::error!("Error getting brightness: {}", e);
            DEFAULT_BRIGHTNESS
        }
    }
}
