//! Server configuration

pub mod broker_config;
pub mod logging_config;
pub mod rooms_config;
pub mod server_config;

pub use broker_config::BrokerConfig;
pub use logging_config::LoggingConfig;
pub use rooms_config::RoomsConfig;
pub use server_config::ServerConfig;
