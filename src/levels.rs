//! Named brightness levels.
//!
//! A level is a named percentage range. Requests that name a level get the
//! integer midpoint of its range.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, DEFAULT_BRIGHTNESS};

/// An inclusive percentage range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrightnessRange {
    /// Lower bound (percent)
    pub min: u8,
    /// Upper bound (percent)
    pub max: u8,
}

impl BrightnessRange {
    /// Create a range.
    pub const fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    /// Integer midpoint of the range.
    pub fn midpoint(&self) -> u8 {
        ((u16::from(self.min) + u16::from(self.max)) / 2) as u8
    }
}

/// Level name to range table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Levels(BTreeMap<String, BrightnessRange>);

impl Default for Levels {
    fn default() -> Self {
        let table = [
            ("very_dark", BrightnessRange::new(5, 15)),
            ("dark", BrightnessRange::new(15, 30)),
            ("dim", BrightnessRange::new(30, 50)),
            ("normal", BrightnessRange::new(50, 70)),
            ("bright", BrightnessRange::new(70, 90)),
            ("very_bright", BrightnessRange::new(90, 100)),
        ];
        Self(
            table
                .into_iter()
                .map(|(name, range)| (name.to_string(), range))
                .collect(),
        )
    }
}

impl Levels {
    /// Look up a level by name, ignoring case.
    pub fn get(&self, level: &str) -> Option<&BrightnessRange> {
        self.0.get(&level.to_lowercase())
    }

    /// Whether the level is defined.
    pub fn contains(&self, level: &str) -> bool {
        self.get(level).is_some()
    }

    /// Midpoint brightness for a level, or the default 50% if it is unknown.
    pub fn brightness_for(&self, level: &str) -> u8 {
        match self.get(level) {
            Some(range) => range.midpoint(),
            None => {
                tracing::warn!(
                    "Unknown brightness level '{}', using {}%",
                    level,
                    DEFAULT_BRIGHTNESS
                );
                DEFAULT_BRIGHTNESS
            }
        }
    }

    /// Iterate over level names and ranges in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BrightnessRange)> {
        self.0.iter().map(|(name, range)| (name.as_str(), range))
    }

    /// Check every range is well formed.
    pub fn validate(&self) -> Result<(), Error> {
        for (name, range) in self.iter() {
            if range.min > range.max || range.max > 100 {
                return Err(Error::Config(format!(
                    "Level '{}' has invalid range {}..{}",
                    name, range.min, range.max
                )));
            }
            if name.chars().any(char::is_uppercase) {
                return Err(Error::Config(format!(
                    "Level name '{}' must be lowercase",
                    name
                )));
            }
        }
        Ok(())
    }
}
