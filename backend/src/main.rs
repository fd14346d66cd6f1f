use std::path::Path;

use config_loader::find_config_file;
use roomdrop_server::config::LoggingConfig;
use roomdrop_server::tcp::{self, TcpServer};
use roomdrop_server::{BrokerConfig, RoomRegistry, SignalingBroker};

fn main() {
    println!("Roomdrop broker - Starting...");

    let config = load_config();
    let logger = initialize_logger(&config.logging);
    logger.info("Roomdrop broker starting...");

    run_tcp_server(&config, logger);
}

/// Initializes the main logger from configuration
fn initialize_logger(config: &LoggingConfig) -> logging::Logger {
    let level = logging::LogLevel::parse_lenient(&config.log_level);

    if !config.enable_file {
        return logging::Logger::console(level).for_component("Main");
    }

    match logging::Logger::to_file(Path::new(&config.log_file_path), level, config.enable_console) {
        Ok(logger) => {
            println!(
                "Logging initialized: {} (level: {})",
                config.log_file_path, level
            );
            logger.for_component("Main")
        }
        Err(e) => {
            eprintln!("Failed to create logger: {}", e);
            eprintln!("Cannot continue without logging system.");
            std::process::exit(1);
        }
    }
}

/// Loads configuration in this order: the `CONFIG` environment variable as
/// inline JSON, the first command-line argument, `server_config.json` from
/// the usual locations, then built-in defaults.
fn load_config() -> BrokerConfig {
    if let Ok(json_str) = std::env::var("CONFIG") {
        match BrokerConfig::from_json("CONFIG", &json_str) {
            Ok(config) => {
                println!("Configuration loaded from CONFIG env as JSON string");
                return config;
            }
            Err(e) => eprintln!("CONFIG env is not valid JSON: {}", e),
        }
    }

    let config_path = match std::env::args().nth(1) {
        Some(path) => path,
        None => match find_config_file("server_config.json") {
            Ok(path) => path.display().to_string(),
            Err(_) => {
                println!("No configuration file found, using default values");
                return BrokerConfig::default();
            }
        },
    };

    match BrokerConfig::load_from_file(&config_path) {
        Ok(config) => {
            println!("Configuration loaded from: {}", config_path);
            config
        }
        Err(e) => {
            eprintln!("Failed to load configuration from {}: {}", config_path, e);
            eprintln!("Using default values...");
            BrokerConfig::default()
        }
    }
}

/// Runs the broker loop and the TCP server (blocking)
fn run_tcp_server(config: &BrokerConfig, main_logger: logging::Logger) {
    let bind_addr = config.server.bind_addr();
    let tcp_logger = main_logger.for_component("TCP");

    let broker = SignalingBroker::new(
        RoomRegistry::new(&config.rooms),
        main_logger.for_component("Broker"),
    );
    let (events, broker_thread) = tcp::spawn_broker(broker);

    let tcp_server = TcpServer::new(
        events.clone(),
        tcp_logger.clone(),
        config.server.max_connections,
    );

    let tcp_server = if config.server.enable_tls {
        let Some(pkcs12_path) = &config.server.pkcs12_path else {
            tcp_logger.error("TLS enabled but pkcs12_path not set in config");
            tcp_logger.error("Server will NOT start - please provide certificate path");
            return;
        };
        let password = config.server.pkcs12_password.as_deref().unwrap_or("");

        match tcp_server.with_tls(Path::new(pkcs12_path), password) {
            Ok(server) => server,
            Err(e) => {
                tcp_logger.error(&format!("Failed to enable TLS: {}", e));
                tcp_logger.error("Server will NOT start without valid TLS certificate");
                return;
            }
        }
    } else {
        tcp_logger.warn("TLS is DISABLED - connections will not be encrypted!");
        tcp_server
    };

    println!("TCP Server starting on {}", bind_addr);
    let result = tcp_server.start(&bind_addr);

    let _ = events.send(tcp::BrokerEvent::Shutdown);
    let _ = broker_thread.join();

    if let Err(e) = result {
        tcp_logger.error(&format!("TCP server error: {}", e));
        std::process::exit(1);
    }
}
