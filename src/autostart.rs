//! Start brightsync at login.
//!
//! Uses an XDG autostart entry (`~/.config/autostart/brightsync.desktop`),
//! which GNOME, KDE, XFCE and most other desktops honour.

use std::path::{Path, PathBuf};

use crate::Error;

/// Application name written into the desktop entry.
pub const APP_NAME: &str = "Brightness Sync";

/// Desktop entry filename.
pub const ENTRY_FILENAME: &str = "brightsync.desktop";

/// Login autostart registration.
#[derive(Debug, Clone)]
pub struct Autostart {
    entry: PathBuf,
    command: String,
}

impl Autostart {
    /// Register `command` in the user's XDG autostart directory.
    ///
    /// Uses `$XDG_CONFIG_HOME/autostart`, falling back to `$HOME/.config/autostart`.
    pub fn new(command: impl Into<String>) -> Result<Self, Error> {
        let config_home = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
            .ok_or_else(|| {
                Error::Config("Neither XDG_CONFIG_HOME nor HOME is set".to_string())
            })?;
        Ok(Self::in_dir(config_home.join("autostart"), command))
    }

    /// Register the running executable with the `serve` subcommand.
    pub fn for_current_exe() -> Result<Self, Error> {
        let exe = std::env::current_exe()?;
        Self::new(format!("\"{}\" serve", exe.display()))
    }

    /// Use an explicit autostart directory.
    pub fn in_dir(dir: impl AsRef<Path>, command: impl Into<String>) -> Self {
        Self {
            entry: dir.as_ref().join(ENTRY_FILENAME),
            command: command.into(),
        }
    }

    /// Path of the desktop entry.
    pub fn entry_path(&self) -> &Path {
        &self.entry
    }

    /// Whether the entry exists.
    pub fn is_enabled(&self) -> bool {
        self.entry.is_file()
    }

    /// Write the desktop entry.
    pub fn enable(&self) -> Result<(), Error> {
        if let Some(dir) = self.entry.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&self.entry, self.desktop_entry())?;
        tracing::info!("Autostart enabled ({})", self.entry.display());
        Ok(())
    }

    /// Remove the desktop entry if present.
    pub fn disable(&self) -> Result<(), Error> {
        match std::fs::remove_file(&self.entry) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        tracing::info!("Autostart disabled");
        Ok(())
    }

    /// Flip the current state. Returns whether autostart is now enabled.
    pub fn toggle(&self) -> Result<bool, Error> {
        if self.is_enabled() {
            self.disable()?;
            Ok(false)
        } else {
            self.enable()?;
            Ok(true)
        }
    }

    fn desktop_entry(&self) -> String {
        format!(
            "[Desktop Entry]\n\
             Type=Application\n\
             Name={}\n\
             Comment=Sync laptop brightness from your phone\n\
             Exec={}\n\
             Terminal=false\n\
             X-GNOME-Autostart-enabled=true\n",
            APP_NAME, self.command
        )
    }
}
