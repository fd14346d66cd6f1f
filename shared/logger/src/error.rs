//! Error types for logging operations.

use std::io;

use thiserror::Error;

/// Result type for logging operations.
pub type Result<T> = std::result::Result<T, LoggingError>;

/// Errors that can occur while setting up a logger.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log file could not be opened.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A level name that is not one of debug/info/warn/error.
    #[error("unknown log level '{0}'")]
    UnknownLevel(String),
}
