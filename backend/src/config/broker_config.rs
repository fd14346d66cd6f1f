use config_loader::{ConfigError, from_json_str, load_json};
use serde::{Deserialize, Serialize};

use crate::config::{LoggingConfig, RoomsConfig, ServerConfig};

/// Complete broker configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub rooms: RoomsConfig,
}

impl BrokerConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        load_json(path)
    }

    /// Decode configuration passed inline, e.g. through the `CONFIG` variable
    pub fn from_json(origin: &str, json: &str) -> Result<Self, ConfigError> {
        from_json_str(origin, json)
    }
}
