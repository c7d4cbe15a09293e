//! OS display brightness backends.
//!
//! Everything above this module speaks percentages. A backend turns those into
//! whatever the platform wants and back.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::Error;

/// Location of backlight devices
pub const DEVICES_PATH: &str = "/sys/class/backlight";

/// Filename for device's max brightness
const FILE_MAX_BRIGHTNESS: &str = "max_brightness";

/// Filename for current brightness as reported by the hardware
const FILE_ACTUAL_BRIGHTNESS: &str = "actual_brightness";

/// Filename the requested brightness is written to (and read from when
/// `actual_brightness` is missing)
const FILE_BRIGHTNESS: &str = "brightness";

/// Read and write display brightness as a percentage.
pub trait BrightnessBackend: Send + Sync {
    /// Short human-readable backend name for logs.
    fn name(&self) -> &str;

    /// Current brightness in percent.
    fn get_brightness(&self) -> Result<u8, Error>;

    /// Apply a brightness percentage.
    fn set_brightness(&self, percent: u8) -> Result<(), Error>;
}

impl<T: BrightnessBackend + ?Sized> BrightnessBackend for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn get_brightness(&self) -> Result<u8, Error> {
        (**self).get_brightness()
    }

    fn set_brightness(&self, percent: u8) -> Result<(), Error> {
        (**self).set_brightness(percent)
    }
}

/// Linux sysfs backlight device (e.g. `/sys/class/backlight/intel_backlight`).
///
/// Writing needs permission on the `brightness` file, usually granted through
/// a udev rule or membership of the `video` group.
#[derive(Debug, Clone)]
pub struct SysfsBacklight {
    dir: PathBuf,
    name: String,
    max: u32,
}

impl SysfsBacklight {
    /// Open a specific device directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, Error> {
        let dir = dir.into();
        let max = read_u32(&dir.join(FILE_MAX_BRIGHTNESS))?;
        if max == 0 {
            return Err(Error::Backend(format!(
                "{} reports max_brightness of 0",
                dir.display()
            )));
        }
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());

        tracing::debug!("Opened backlight {} (max {})", name, max);
        Ok(Self { dir, name, max })
    }

    /// Open the first device under [`DEVICES_PATH`].
    pub fn discover() -> Result<Self, Error> {
        Self::discover_in(DEVICES_PATH)
    }

    /// Open the first device (by name) under the given directory.
    pub fn discover_in(root: impl AsRef<Path>) -> Result<Self, Error> {
        let root = root.as_ref();
        let mut devices: Vec<PathBuf> = std::fs::read_dir(root)
            .map_err(|e| Error::Backend(format!("Cannot list {}: {}", root.display(), e)))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.join(FILE_MAX_BRIGHTNESS).exists())
            .collect();
        devices.sort();

        match devices.into_iter().next() {
            Some(dir) => Self::new(dir),
            None => Err(Error::Backend(format!(
                "No backlight device found in {}",
                root.display()
            ))),
        }
    }

    /// Raw hardware maximum.
    pub fn max_raw(&self) -> u32 {
        self.max
    }

    fn to_percent(&self, raw: u32) -> u8 {
        let pct = (f64::from(raw) * 100.0 / f64::from(self.max)).round();
        pct.clamp(0.0, 100.0) as u8
    }

    fn to_raw(&self, percent: u8) -> u32 {
        let raw = (f64::from(percent.min(100)) * f64::from(self.max) / 100.0).round() as u32;
        // Never blank the panel for a non-zero request
        if percent > 0 {
            raw.max(1)
        } else {
            raw
        }
    }
}

impl BrightnessBackend for SysfsBacklight {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_brightness(&self) -> Result<u8, Error> {
        let actual = self.dir.join(FILE_ACTUAL_BRIGHTNESS);
        let path = if actual.exists() {
            actual
        } else {
            self.dir.join(FILE_BRIGHTNESS)
        };
        read_u32(&path).map(|raw| self.to_percent(raw))
    }

    fn set_brightness(&self, percent: u8) -> Result<(), Error> {
        let path = self.dir.join(FILE_BRIGHTNESS);
        let raw = self.to_raw(percent);
        std::fs::write(&path, raw.to_string())
            .map_err(|e| Error::Backend(format!("Cannot write {}: {}", path.display(), e)))
    }
}

fn read_u32(path: &Path) -> Result<u32, Error> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Backend(format!("Cannot read {}: {}", path.display(), e)))?;
    content.trim().parse().map_err(|e| {
        Error::Backend(format!(
            "Unexpected contents in {}: {:?} ({})",
            path.display(),
            content.trim(),
            e
        ))
    })
}

/// In-memory display used for dry runs and tests.
///
/// Records every value written so callers can inspect a transition.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    current: Mutex<u8>,
    history: Mutex<Vec<u8>>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryBackend {
    /// Create a display starting at the given brightness.
    pub fn new(initial: u8) -> Self {
        Self {
            current: Mutex::new(initial),
            ..Default::default()
        }
    }

    /// Make every read fail.
    #[must_use]
    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// Make every write fail.
    #[must_use]
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Every value written so far, oldest first.
    pub fn history(&self) -> Vec<u8> {
        self.history
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default()
    }
}

impl BrightnessBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn get_brightness(&self) -> Result<u8, Error> {
        if self.fail_reads {
            return Err(Error::Backend("simulated read failure".to_string()));
        }
        self.current
            .lock()
            .map(|v| *v)
            .map_err(|_| Error::Backend("memory backend lock poisoned".to_string()))
    }

    fn set_brightness(&self, percent: u8) -> Result<(), Error> {
        if self.fail_writes {
            return Err(Error::Backend("simulated write failure".to_string()));
        }
        let mut current = self
            .current
            .lock()
            .map_err(|_| Error::Backend("memory backend lock poisoned".to_string()))?;
        *current = percent;
        if let Ok(mut history) = self.history.lock() {
            history.push(percent);
        }
        Ok(())
    }
}
