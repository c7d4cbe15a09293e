//! Stepped brightness transitions.
//!
//! Jumping straight from 20% to 80% is jarring, so changes are spread over a
//! fixed number of equal steps with a short pause between each. The final write
//! is always the exact target, whatever rounding the steps introduced.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::BrightnessBackend;
use crate::{Error, MAX_BRIGHTNESS, MIN_BRIGHTNESS};

/// Transition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// Whether smooth transitions are allowed at all
    pub smooth: bool,
    /// Number of intermediate steps
    pub steps: u32,
    /// Pause between steps in milliseconds
    pub delay_ms: u64,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            smooth: true,
            steps: 10,
            delay_ms: 100,
        }
    }
}

impl TransitionConfig {
    /// Pause between steps.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Total time a full transition blocks for.
    pub fn duration(&self) -> Duration {
        self.delay() * self.steps
    }
}

/// Compute the values written during a transition, final target included.
///
/// Intermediate values are truncated toward zero and clamped to `[1,100]`. An
/// unchanged target yields no writes.
///
/// ```
/// use brightsync::transition::plan;
///
/// assert_eq!(plan(20, 80, 4), vec![35, 50, 65, 80, 80]);
/// assert!(plan(50, 50, 10).is_empty());
/// ```
pub fn plan(current: u8, target: u8, steps: u32) -> Vec<u8> {
    if current == target {
        return Vec::new();
    }

    let start = f64::from(current);
    let delta = f64::from(target) - start;

    let mut values: Vec<u8> = (1..=steps)
        .map(|i| {
            let value = (start + delta * f64::from(i) / f64::from(steps)).trunc();
            value.clamp(f64::from(MIN_BRIGHTNESS), f64::from(MAX_BRIGHTNESS)) as u8
        })
        .collect();
    values.push(target);
    values
}

/// Walk the backend from `current` to `target`, sleeping between steps.
///
/// Blocks the calling thread for roughly `steps * delay`.
pub fn run<B>(backend: &B, current: u8, target: u8, config: &TransitionConfig) -> Result<(), Error>
where
    B: BrightnessBackend + ?Sized,
{
    let values = plan(current, target, config.steps);
    let last = values.len().saturating_sub(1);

    for (i, value) in values.into_iter().enumerate() {
        tracing::debug!("Transition step {}: {}%", i + 1, value);
        backend.set_brightness(value)?;
        if i < last && !config.delay().is_zero() {
            std::thread::sleep(config.delay());
        }
    }

    Ok(())
}
