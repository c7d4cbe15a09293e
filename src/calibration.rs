//! Phone-to-laptop brightness calibration.
//!
//! A phone reports brightness as a fraction of its own panel's range. The same
//! fraction on a dimmer laptop panel looks very different, so the fraction is
//! pushed through a calibration curve before it becomes a backlight percentage.
//!
//! Four curves are available:
//!
//! | Curve | Formula |
//! |-------|---------|
//! | `lut` | piecewise-linear interpolation over a breakpoint table |
//! | `perceptual` | gamma-decode to nits, cap at laptop max, gamma-encode |
//! | `logarithmic` | `log10(9x + 1) * laptop_nits / phone_nits` |
//! | `linear` | `x / (laptop_nits / phone_nits)` |
//!
//! Whatever the curve, the percentage is clamped to the configured
//! `[min_brightness, max_brightness]` window.
//!
//! # Example
//!
//! ```
//! use brightsync::calibration::DisplayCalibration;
//!
//! let calibration = DisplayCalibration::default();
//!
//! assert_eq!(calibration.calibrate(0.0), 5);
//! assert_eq!(calibration.calibrate(0.5), 68);
//! assert_eq!(calibration.calibrate(1.0), 95);
//! ```

use serde::{Deserialize, Serialize};

use crate::Error;

/// Curve used to map source brightness onto the laptop panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveMode {
    /// Interpolate over [`CalibrationTable`] breakpoints
    #[default]
    Lut,
    /// Gamma curves on both panels, matched in absolute nits
    Perceptual,
    /// Logarithmic response scaled by the nits ratio
    Logarithmic,
    /// Straight ratio of panel peak luminance
    Linear,
}

/// A single `(source, target)` pair of the calibration table.
///
/// Serialized as a two-element array: `[0.5, 0.68]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Breakpoint {
    /// Phone brightness fraction
    pub source: f64,
    /// Laptop brightness fraction
    pub target: f64,
}

impl Breakpoint {
    /// Create a breakpoint.
    pub const fn new(source: f64, target: f64) -> Self {
        Self { source, target }
    }
}

impl From<(f64, f64)> for Breakpoint {
    fn from((source, target): (f64, f64)) -> Self {
        Self { source, target }
    }
}

impl From<Breakpoint> for (f64, f64) {
    fn from(point: Breakpoint) -> Self {
        (point.source, point.target)
    }
}

/// Calibration for an iPhone XR (625 nits) driving an AUO B156HAN15.H (300 nits).
const DEFAULT_LUT: [(f64, f64); 12] = [
    (0.0, 0.05),
    (0.05, 0.10),
    (0.1, 0.18),
    (0.2, 0.32),
    (0.3, 0.45),
    (0.4, 0.58),
    (0.5, 0.68),
    (0.6, 0.75),
    (0.7, 0.82),
    (0.8, 0.88),
    (0.9, 0.92),
    (1.0, 0.95),
];

/// Absorbs float error before truncating a percentage.
const TRUNCATION_EPSILON: f64 = 1e-9;

/// Ordered breakpoint table defining a piecewise-linear mapping on `[0,1]`.
///
/// Invariants, checked by [`CalibrationTable::new`] and on deserialization:
/// - at least one breakpoint
/// - every coordinate lies in `[0,1]`
/// - sources and targets are both non-decreasing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Breakpoint>", into = "Vec<Breakpoint>")]
pub struct CalibrationTable {
    points: Vec<Breakpoint>,
}

impl CalibrationTable {
    /// Build a table, rejecting empty, out-of-range, or unordered breakpoints.
    pub fn new(points: Vec<Breakpoint>) -> Result<Self, Error> {
        if points.is_empty() {
            return Err(Error::Config(
                "Calibration table needs at least one breakpoint".to_string(),
            ));
        }

        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if let Some(bad) = points
            .iter()
            .find(|p| !in_unit(p.source) || !in_unit(p.target))
        {
            return Err(Error::Config(format!(
                "Calibration breakpoint ({}, {}) is outside [0, 1]",
                bad.source, bad.target
            )));
        }

        if let Some(pair) = points
            .windows(2)
            .find(|w| w[1].source < w[0].source || w[1].target < w[0].target)
        {
            return Err(Error::Config(format!(
                "Calibration breakpoints must be non-decreasing: ({}, {}) followed by ({}, {})",
                pair[0].source, pair[0].target, pair[1].source, pair[1].target
            )));
        }

        Ok(Self { points })
    }

    /// The breakpoints in order.
    pub fn points(&self) -> &[Breakpoint] {
        &self.points
    }

    /// Map a source fraction to a target fraction.
    ///
    /// The input is clamped to `[0,1]`. Inside the table the bracketing segment
    /// is linearly interpolated; outside it the nearest endpoint is returned.
    pub fn interpolate(&self, source: f64) -> f64 {
        let x = clamp_unit(source);

        for segment in self.points.windows(2) {
            let (lo, hi) = (segment[0], segment[1]);
            if lo.source <= x && x <= hi.source {
                let width = hi.source - lo.source;
                let ratio = if width > 0.0 {
                    (x - lo.source) / width
                } else {
                    0.0
                };
                return lo.target + ratio * (hi.target - lo.target);
            }
        }

        // Non-empty by construction
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];
        if x <= first.source {
            first.target
        } else {
            last.target
        }
    }
}

impl Default for CalibrationTable {
    fn default() -> Self {
        Self {
            points: DEFAULT_LUT.iter().copied().map(Breakpoint::from).collect(),
        }
    }
}

impl TryFrom<Vec<Breakpoint>> for CalibrationTable {
    type Error = Error;

    fn try_from(points: Vec<Breakpoint>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<CalibrationTable> for Vec<Breakpoint> {
    fn from(table: CalibrationTable) -> Self {
        table.points
    }
}

/// Display pairing and curve selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayCalibration {
    /// Peak luminance of the source (phone) panel in nits
    pub source_max_nits: f64,
    /// Peak luminance of the laptop panel in nits
    pub target_max_nits: f64,
    /// Gamma of the source panel
    pub source_gamma: f64,
    /// Gamma of the laptop panel
    pub target_gamma: f64,
    /// Which curve to apply
    pub curve: CurveMode,
    /// Floor for the resulting percentage
    pub min_brightness: u8,
    /// Ceiling for the resulting percentage
    pub max_brightness: u8,
    /// Breakpoints used by [`CurveMode::Lut`]
    pub lut: CalibrationTable,
}

impl Default for DisplayCalibration {
    fn default() -> Self {
        Self {
            source_max_nits: 625.0,
            target_max_nits: 300.0,
            source_gamma: 2.2,
            target_gamma: 2.2,
            curve: CurveMode::Lut,
            min_brightness: 5,
            max_brightness: 95,
            lut: CalibrationTable::default(),
        }
    }
}

impl DisplayCalibration {
    /// Use a different curve.
    #[must_use]
    pub fn with_curve(mut self, curve: CurveMode) -> Self {
        self.curve = curve;
        self
    }

    /// Use a different floor and ceiling.
    #[must_use]
    pub fn with_bounds(mut self, min: u8, max: u8) -> Self {
        self.min_brightness = min;
        self.max_brightness = max;
        self
    }

    /// Check that the parameters produce finite, in-range output.
    pub fn validate(&self) -> Result<(), Error> {
        for (name, value) in [
            ("source_max_nits", self.source_max_nits),
            ("target_max_nits", self.target_max_nits),
            ("source_gamma", self.source_gamma),
            ("target_gamma", self.target_gamma),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::Config(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        if self.min_brightness > self.max_brightness || self.max_brightness > 100 {
            return Err(Error::Config(format!(
                "Calibration bounds must satisfy min <= max <= 100, got {}..{}",
                self.min_brightness, self.max_brightness
            )));
        }

        Ok(())
    }

    /// Map a source brightness fraction to a laptop brightness percentage.
    ///
    /// The percentage is truncated toward zero and always lies in
    /// `[min_brightness, max_brightness]`. Breakpoint targets land exactly
    /// despite float noise (0.58 maps to 58, not 57).
    pub fn calibrate(&self, source: f64) -> u8 {
        let x = clamp_unit(source);
        let fraction = self.curve_fraction(x);

        let min = f64::from(self.min_brightness);
        let max = f64::from(self.max_brightness);
        let percent = (fraction * 100.0 + TRUNCATION_EPSILON).trunc().max(min).min(max);
        let result = if percent.is_finite() {
            percent as u8
        } else {
            self.min_brightness
        };

        tracing::info!(
            "Calibration: source {:.2} -> laptop {}% (method: {:?})",
            x,
            result,
            self.curve
        );
        result
    }

    fn curve_fraction(&self, x: f64) -> f64 {
        let nits_ratio = self.target_max_nits / self.source_max_nits;

        match self.curve {
            CurveMode::Lut => self.lut.interpolate(x),
            CurveMode::Perceptual => {
                let source_nits = self.source_max_nits * x.powf(self.source_gamma);
                let target_nits = source_nits.min(self.target_max_nits);
                (target_nits / self.target_max_nits).powf(1.0 / self.target_gamma)
            }
            CurveMode::Logarithmic => {
                if x > 0.0 {
                    (x * 9.0 + 1.0).log10() * nits_ratio
                } else {
                    0.0
                }
            }
            CurveMode::Linear => x / nits_ratio,
        }
    }
}

/// Normalize a raw source value into a fraction.
///
/// Values up to 1 are already fractions; anything larger is a percentage.
///
/// ```
/// use brightsync::calibration::normalize_source;
///
/// assert_eq!(normalize_source(0.4), 0.4);
/// assert_eq!(normalize_source(40.0), 0.4);
/// ```
pub fn normalize_source(value: f64) -> f64 {
    if value <= 1.0 {
        value
    } else {
        value / 100.0
    }
}

fn clamp_unit(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> impl Iterator<Item = f64> {
        (0..=1000).map(|i| f64::from(i) / 1000.0)
    }

    #[test]
    fn test_lut_endpoints_match_breakpoints() {
        let cal = DisplayCalibration::default();
        assert_eq!(cal.calibrate(0.0), 5);
        assert_eq!(cal.calibrate(1.0), 95);
    }

    #[test]
    fn test_lut_breakpoints_and_midpoints() {
        let cal = DisplayCalibration::default();
        assert_eq!(cal.calibrate(0.2), 32);
        assert_eq!(cal.calibrate(0.4), 58);
        assert_eq!(cal.calibrate(0.5), 68);
        assert_eq!(cal.calibrate(0.45), 63);
        assert_eq!(cal.calibrate(0.15), 25);
    }

    #[test]
    fn test_mid_segment_values_truncate() {
        let cal = DisplayCalibration::default();
        // 0.45 + 0.3 * 0.13 = 0.489
        assert_eq!(cal.calibrate(0.33), 48);
        // 0.68 + 0.5 * 0.07 = 0.715
        assert_eq!(cal.calibrate(0.55), 71);
        assert_eq!(cal.calibrate(0.05), 10);
        assert_eq!(cal.calibrate(0.7), 82);
    }

    #[test]
    fn test_out_of_range_input_is_clamped() {
        let cal = DisplayCalibration::default();
        assert_eq!(cal.calibrate(-3.0), cal.calibrate(0.0));
        assert_eq!(cal.calibrate(7.5), cal.calibrate(1.0));
        assert_eq!(cal.calibrate(f64::NAN), cal.calibrate(0.0));
    }

    #[test]
    fn test_every_curve_stays_within_bounds() {
        for curve in [
            CurveMode::Lut,
            CurveMode::Perceptual,
            CurveMode::Logarithmic,
            CurveMode::Linear,
        ] {
            let cal = DisplayCalibration::default().with_curve(curve);
            for x in samples() {
                let pct = cal.calibrate(x);
                assert!((5..=95).contains(&pct), "{:?} at {} gave {}", curve, x, pct);
            }
        }
    }

    #[test]
    fn test_lut_is_monotonic() {
        let cal = DisplayCalibration::default();
        let mut previous = 0;
        for x in samples() {
            let pct = cal.calibrate(x);
            assert!(pct >= previous, "dropped from {} to {} at {}", previous, pct, x);
            previous = pct;
        }
    }

    #[test]
    fn test_custom_bounds_apply_to_breakpoints() {
        let cal = DisplayCalibration::default().with_bounds(20, 60);
        assert_eq!(cal.calibrate(0.0), 20);
        assert_eq!(cal.calibrate(1.0), 60);
    }

    #[test]
    fn test_perceptual_curve() {
        let cal = DisplayCalibration::default().with_curve(CurveMode::Perceptual);
        // Phone peak exceeds the laptop panel, so the laptop saturates
        assert_eq!(cal.calibrate(1.0), 95);
        assert_eq!(cal.calibrate(0.0), 5);
        let mid = cal.calibrate(0.5);
        assert!((65..=75).contains(&mid), "got {}", mid);
    }

    #[test]
    fn test_logarithmic_curve() {
        let cal = DisplayCalibration::default().with_curve(CurveMode::Logarithmic);
        // log10(10) * 300/625
        assert_eq!(cal.calibrate(1.0), 48);
        assert_eq!(cal.calibrate(0.0), 5);
    }

    #[test]
    fn test_linear_curve() {
        let cal = DisplayCalibration::default().with_curve(CurveMode::Linear);
        assert_eq!(cal.calibrate(0.24), 50);
        assert_eq!(cal.calibrate(0.6), 95);
    }

    #[test]
    fn test_single_point_table() {
        let table = CalibrationTable::new(vec![Breakpoint::new(0.5, 0.4)]).unwrap();
        assert_eq!(table.interpolate(0.0), 0.4);
        assert_eq!(table.interpolate(0.5), 0.4);
        assert_eq!(table.interpolate(1.0), 0.4);
    }

    #[test]
    fn test_table_outside_breakpoints_uses_endpoints() {
        let table =
            CalibrationTable::new(vec![Breakpoint::new(0.2, 0.3), Breakpoint::new(0.8, 0.9)])
                .unwrap();
        assert_eq!(table.interpolate(0.1), 0.3);
        assert_eq!(table.interpolate(0.95), 0.9);
        assert!((table.interpolate(0.5) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_zero_width_segment() {
        let table = CalibrationTable::new(vec![
            Breakpoint::new(0.0, 0.1),
            Breakpoint::new(0.5, 0.2),
            Breakpoint::new(0.5, 0.6),
            Breakpoint::new(1.0, 0.9),
        ])
        .unwrap();
        assert_eq!(table.interpolate(0.5), 0.2);
    }

    #[test]
    fn test_table_validation() {
        assert!(CalibrationTable::new(vec![]).is_err());
        assert!(CalibrationTable::new(vec![Breakpoint::new(0.0, 1.5)]).is_err());
        assert!(CalibrationTable::new(vec![
            Breakpoint::new(0.5, 0.5),
            Breakpoint::new(0.2, 0.6),
        ])
        .is_err());
        assert!(CalibrationTable::new(vec![
            Breakpoint::new(0.2, 0.6),
            Breakpoint::new(0.5, 0.5),
        ])
        .is_err());
    }

    #[test]
    fn test_table_deserializes_from_pairs() {
        let table: CalibrationTable = serde_json::from_str("[[0.0, 0.1], [1.0, 0.9]]").unwrap();
        assert_eq!(table.points().len(), 2);
        assert_eq!(table.points()[1], Breakpoint::new(1.0, 0.9));

        let bad = serde_json::from_str::<CalibrationTable>("[[0.5, 0.1], [0.1, 0.9]]");
        assert!(bad.is_err());
    }

    #[test]
    fn test_validate() {
        assert!(DisplayCalibration::default().validate().is_ok());
        assert!(DisplayCalibration::default()
            .with_bounds(80, 20)
            .validate()
            .is_err());

        let cal = DisplayCalibration {
            target_max_nits: 0.0,
            ..Default::default()
        };
        assert!(cal.validate().is_err());
    }

    #[test]
    fn test_curve_mode_serialization() {
        assert_eq!(
            serde_json::to_string(&CurveMode::Perceptual).unwrap(),
            "\"perceptual\""
        );
        let mode: CurveMode = serde_json::from_str("\"lut\"").unwrap();
        assert_eq!(mode, CurveMode::Lut);
    }

    #[test]
    fn test_normalize_source() {
        assert_eq!(normalize_source(0.0), 0.0);
        assert_eq!(normalize_source(1.0), 1.0);
        assert_eq!(normalize_source(50.0), 0.5);
        assert_eq!(normalize_source(100.0), 1.0);
    }
}
