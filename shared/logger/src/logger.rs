//! Thread-safe, non-blocking logger.
//!
//! This module provides the main [`Logger`] handle. Clones and component
//! loggers share one sink, so a single file writer thread serves the whole
//! process.

use crate::error::Result;
use crate::log_level::LogLevel;
use crate::log_message::LogRecord;
use crate::log_writer::Sink;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Cloneable logging handle tagged with an optional component name.
///
/// # Examples
///
/// ```
/// use logging::{Logger, LogLevel};
///
/// let (logger, lines) = Logger::capture(LogLevel::Debug);
/// let broker = logger.for_component("Broker");
/// broker.info("room 7F2K created");
/// assert!(lines.lock().unwrap()[0].contains("[component: Broker]"));
/// ```
#[derive(Debug, Clone)]
pub struct Logger {
    sink: Sink,
    level: LogLevel,
    component: Option<String>,
    console_output: bool,
}

/// Shared handle to the lines recorded by [`Logger::capture`].
pub type CapturedLines = Arc<Mutex<Vec<String>>>;

impl Logger {
    /// Creates a logger appending to `log_path` (created if missing).
    ///
    /// # Errors
    ///
    /// Returns error if the log file cannot be created or opened.
    pub fn to_file(log_path: &Path, level: LogLevel, console_output: bool) -> Result<Self> {
        Ok(Logger {
            sink: Sink::file(log_path)?,
            level,
            component: None,
            console_output,
        })
    }

    /// Console-only logger (no file).
    pub fn console(level: LogLevel) -> Self {
        Logger {
            sink: Sink::Discard,
            level,
            component: None,
            console_output: true,
        }
    }

    /// Logger that records nothing.
    pub fn disabled() -> Self {
        Logger {
            sink: Sink::Discard,
            level: LogLevel::Error,
            component: None,
            console_output: false,
        }
    }

    /// Logger that keeps every formatted line in memory.
    pub fn capture(level: LogLevel) -> (Self, CapturedLines) {
        let lines: CapturedLines = Arc::new(Mutex::new(Vec::new()));
        let logger = Logger {
            sink: Sink::Memory(lines.clone()),
            level,
            component: None,
            console_output: false,
        };
        (logger, lines)
    }

    /// Same sink and level, different component tag.
    pub fn for_component(&self, component: &str) -> Self {
        Logger {
            component: Some(component.to_string()),
            ..self.clone()
        }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    fn log(&self, level: LogLevel, message: &str) {
        if level < self.level {
            return;
        }
        let record = LogRecord::now(level, self.component.as_deref(), message);
        if self.console_output {
            println!("{}", record.line());
        }
        self.sink.deliver(record);
    }
}
