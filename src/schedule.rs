//! Brightness level selection based on time of day and day of week.
//!
//! A schedule is an ordered list of named windows, each mapping a time span to a
//! brightness level. The first window containing the current time wins; when
//! none does, the default level (`normal`) is used.
//!
//! # Example Schedule (YAML)
//!
//! ```yaml
//! timezone: "Europe/Kyiv"   # optional, local time when omitted
//! default_level: normal
//!
//! windows:
//!   # Wraps around midnight
//!   - name: night
//!     start: "22:00"
//!     end: "06:00"
//!     level: very_dark
//!
//!   - name: evening
//!     start: "18:00"
//!     end: "22:00"
//!     level: dim
//!
//!   # Later windows only see times earlier ones did not claim
//!   - name: weekend_morning
//!     days: weekends
//!     start: "06:00"
//!     end: "11:00"
//!     level: dim
//! ```
//!
//! Both ends of a window are inclusive, so at exactly `22:00` the `night` window
//! above matches before `evening` is consulted.

use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::levels::Levels;
use crate::Error;

/// An ordered set of time windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrightnessSchedule {
    /// IANA timezone for interpreting times; local time when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// Level used when no window matches
    #[serde(default = "default_level")]
    pub default_level: String,
    /// Windows, evaluated in order (first match wins)
    #[serde(default)]
    pub windows: Vec<TimeWindow>,
}

/// A named span of the day mapped to a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Window name, used in logs
    pub name: String,
    /// Days this window applies to
    #[serde(default)]
    pub days: DaySelector,
    /// Start time (HH:MM, 24-hour format)
    pub start: String,
    /// End time (HH:MM, 24-hour format)
    pub end: String,
    /// Level to apply while the window is active
    pub level: String,
}

/// Day selector for schedule windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DaySelector {
    /// A specific list of days (e.g., ["mon", "tue", "wed"])
    List(Vec<String>),
    /// A named group: "all", "weekdays", "weekends", or a single day name
    Named(String),
}

impl Default for DaySelector {
    fn default() -> Self {
        DaySelector::Named("all".to_string())
    }
}

fn default_level() -> String {
    "normal".to_string()
}

impl Default for BrightnessSchedule {
    fn default() -> Self {
        let window = |name: &str, start: &str, end: &str, level: &str| TimeWindow {
            name: name.to_string(),
            days: DaySelector::default(),
            start: start.to_string(),
            end: end.to_string(),
            level: level.to_string(),
        };

        Self {
            timezone: None,
            default_level: default_level(),
            windows: vec![
                window("night", "22:00", "06:00", "very_dark"),
                window("evening", "18:00", "22:00", "dim"),
                window("morning", "06:00", "09:00", "normal"),
                window("day", "09:00", "18:00", "bright"),
            ],
        }
    }
}

impl BrightnessSchedule {
    /// Current wall-clock time in the schedule's timezone.
    ///
    /// Falls back to the system's local time if the timezone is unset or unknown.
    pub fn now(&self) -> DateTime<FixedOffset> {
        match self.timezone.as_deref().map(str::parse::<Tz>) {
            Some(Ok(tz)) => Utc::now().with_timezone(&tz).fixed_offset(),
            Some(Err(e)) => {
                tracing::warn!("Unknown schedule timezone, using local time: {}", e);
                Local::now().fixed_offset()
            }
            None => Local::now().fixed_offset(),
        }
    }

    /// The first window containing the given time, if any.
    pub fn window_at<T: chrono::TimeZone>(&self, dt: &DateTime<T>) -> Option<&TimeWindow> {
        let weekday = dt.weekday();
        let time = NaiveTime::from_hms_opt(dt.hour(), dt.minute(), dt.second()).unwrap_or_default();

        self.windows.iter().find(|w| w.matches(weekday, time))
    }

    /// Level name for the given time.
    pub fn level_at<T: chrono::TimeZone>(&self, dt: &DateTime<T>) -> &str {
        match self.window_at(dt) {
            Some(window) => {
                tracing::debug!(
                    "Schedule window matched: {} {} -> {} level={}",
                    window.name,
                    window.start,
                    window.end,
                    window.level
                );
                &window.level
            }
            None => {
                tracing::debug!(
                    "No schedule window matched, using default level: {}",
                    self.default_level
                );
                &self.default_level
            }
        }
    }

    /// Midpoint brightness of the level active at the given time.
    pub fn brightness_at<T: chrono::TimeZone>(&self, dt: &DateTime<T>, levels: &Levels) -> u8 {
        levels.brightness_for(self.level_at(dt))
    }

    /// Midpoint brightness of the level active right now.
    pub fn current_brightness(&self, levels: &Levels) -> u8 {
        self.brightness_at(&self.now(), levels)
    }

    /// Check times, day names, timezone and level references.
    pub fn validate(&self, levels: &Levels) -> Result<(), Error> {
        if let Some(tz) = &self.timezone {
            tz.parse::<Tz>()
                .map_err(|e| Error::Config(format!("Invalid schedule timezone '{}': {}", tz, e)))?;
        }

        if !levels.contains(&self.default_level) {
            return Err(Error::Config(format!(
                "Default schedule level '{}' is not defined",
                self.default_level
            )));
        }

        for window in &self.windows {
            for time in [&window.start, &window.end] {
                if parse_time(time).is_none() {
                    return Err(Error::Config(format!(
                        "Window '{}' has invalid time '{}' (expected HH:MM)",
                        window.name, time
                    )));
                }
            }
            if !levels.contains(&window.level) {
                return Err(Error::Config(format!(
                    "Window '{}' refers to undefined level '{}'",
                    window.name, window.level
                )));
            }
            if !window.days.is_valid() {
                return Err(Error::Config(format!(
                    "Window '{}' has an unknown day selector {:?}",
                    window.name, window.days
                )));
            }
        }

        Ok(())
    }
}

impl TimeWindow {
    /// Check if this window covers the given day and time.
    fn matches(&self, weekday: Weekday, time: NaiveTime) -> bool {
        if !self.days.includes(weekday) {
            return false;
        }

        match (parse_time(&self.start), parse_time(&self.end)) {
            (Some(s), Some(e)) if s <= e => time >= s && time <= e,
            // Wraps past midnight (e.g., 22:00 - 06:00)
            (Some(s), Some(e)) => time >= s || time <= e,
            _ => false,
        }
    }
}

impl DaySelector {
    /// Check if this selector applies to the given weekday.
    fn includes(&self, weekday: Weekday) -> bool {
        match self {
            DaySelector::Named(name) => match name.to_lowercase().as_str() {
                "all" => true,
                "weekdays" => !is_weekend(weekday),
                "weekends" => is_weekend(weekday),
                _ => weekday_from_str(name) == Some(weekday),
            },
            DaySelector::List(days) => days.iter().any(|d| weekday_from_str(d) == Some(weekday)),
        }
    }

    fn is_valid(&self) -> bool {
        match self {
            DaySelector::Named(name) => {
                matches!(name.to_lowercase().as_str(), "all" | "weekdays" | "weekends")
                    || weekday_from_str(name).is_some()
            }
            DaySelector::List(days) => days.iter().all(|d| weekday_from_str(d).is_some()),
        }
    }
}

fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Sat | Weekday::Sun)
}

/// Parse a time string (HH:MM) into NaiveTime.
fn parse_time(s: &str) -> Option<NaiveTime> {
    let (hour, minute) = s.trim().split_once(':')?;
    NaiveTime::from_hms_opt(hour.parse().ok()?, minute.parse().ok()?, 0)
}

/// Convert a day name to Weekday.
fn weekday_from_str(s: &str) -> Option<Weekday> {
    match s.to_lowercase().as_str() {
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tuesday" => Some(Weekday::Tue),
        "wed" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}
