//! Error types for brightsync.

use thiserror::Error;

/// Errors that can occur while mapping or applying brightness.
#[derive(Debug, Error)]
pub enum Error {
    /// The OS display backend failed to read or write brightness
    #[error("Brightness backend error: {0}")]
    Backend(String),

    /// Configuration is missing, unreadable, or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem access failed
    #[error("I/O error: {0}")]
    Io(String),

    /// A request carried no usable brightness signal
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}
