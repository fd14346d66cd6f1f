use serde::{Deserialize, Serialize};

/// Listener configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub max_connections: usize,
    pub enable_tls: bool,
    pub pkcs12_path: Option<String>,
    pub pkcs12_password: Option<String>,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_address: "127.0.0.1".to_string(),
            port: 8080,
            max_connections: 100,
            enable_tls: false,
            pkcs12_path: None,
            pkcs12_password: None,
        }
    }
}
