//! Sinks that log records are delivered to.

use crate::error::Result;
use crate::log_message::LogRecord;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};

/// Where records go once they pass the level filter.
#[derive(Debug, Clone)]
pub(crate) enum Sink {
    /// Append-only file fed by a dedicated writer thread.
    File(Sender<LogRecord>),
    /// Formatted lines kept in memory, used by tests to assert on logging.
    Memory(Arc<Mutex<Vec<String>>>),
    /// Drop everything (console echo may still apply).
    Discard,
}

impl Sink {
    /// Opens `path` in append mode and starts the writer thread.
    pub fn file(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let (sender, receiver) = channel();
        std::thread::spawn(move || run_writer(file, receiver));
        Ok(Sink::File(sender))
    }

    pub fn deliver(&self, record: LogRecord) {
        match self {
            // Writer thread gone means the process is shutting down.
            Sink::File(sender) => {
                let _ = sender.send(record);
            }
            Sink::Memory(lines) => {
                if let Ok(mut lines) = lines.lock() {
                    lines.push(record.line());
                }
            }
            Sink::Discard => {}
        }
    }
}

fn run_writer(mut file: File, receiver: Receiver<LogRecord>) {
    for record in receiver {
        let mut line = record.line();
        line.push('\n');
        if let Err(e) = file.write_all(line.as_bytes()).and_then(|_| file.flush()) {
            eprintln!("Error writing log: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_level::LogLevel;
    use std::fs;
    use std::thread;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_file_sink_creates_and_appends() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("broker.log");

        let sink = Sink::file(&log_path).unwrap();
        assert!(log_path.exists());

        sink.deliver(LogRecord::now(LogLevel::Info, None, "first"));
        sink.deliver(LogRecord::now(LogLevel::Info, None, "second"));
        drop(sink);
        thread::sleep(Duration::from_millis(100));

        let content = fs::read_to_string(log_path).unwrap();
        let first = content.find("first").unwrap();
        let second = content.find("second").unwrap();
        assert!(first < second);
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_memory_sink_collects_lines() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Sink::Memory(lines.clone());
        sink.deliver(LogRecord::now(LogLevel::Debug, Some("Relay"), "dropped"));
        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("DEBUG [component: Relay]: dropped"));
    }
}
