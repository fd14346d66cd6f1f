use std::path::Path;
use std::time::Duration;

use config_loader::{ConfigError, from_json_str, load_json};
use serde::{Deserialize, Serialize};

use crate::transfer::chunker::DEFAULT_CHUNK_SIZE;

/// Transfer tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Bytes per chunk before encoding
    pub chunk_size: u32,
    /// How long the sender waits for an ack before retransmitting
    pub ack_timeout_ms: u64,
    /// Retransmissions of one chunk before the sender pauses
    pub max_retransmits: u32,
    /// Largest file a receiver accepts
    pub max_file_size: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        TransferConfig {
            chunk_size: DEFAULT_CHUNK_SIZE,
            ack_timeout_ms: 10_000,
            max_retransmits: 3,
            max_file_size: 4 * 1024 * 1024 * 1024,
        }
    }
}

impl TransferConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        load_json(path)
    }

    pub fn from_json(origin: &str, json: &str) -> Result<Self, ConfigError> {
        from_json_str(origin, json)
    }

    /// Chunk size, never zero
    pub fn chunk_size(&self) -> u32 {
        self.chunk_size.max(1)
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }
}
