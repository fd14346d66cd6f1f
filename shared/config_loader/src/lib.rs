//! # Config Loader
//!
//! Locates a JSON configuration file on disk and decodes it into any
//! `serde` type. Missing fields are the caller's business: configuration
//! structs are expected to carry `#[serde(default)]`.
//!
//! ```no_run
//! use config_loader::{find_config_file, load_json};
//!
//! #[derive(serde::Deserialize, Default)]
//! #[serde(default)]
//! struct MyConfig {
//!     port: u16,
//! }
//!
//! fn main() -> Result<(), config_loader::ConfigError> {
//!     let path = find_config_file("server_config.json")?;
//!     let config: MyConfig = load_json(&path)?;
//!     println!("port {}", config.port);
//!     Ok(())
//! }
//! ```

pub mod error;

pub use error::{ConfigError, Result};

use serde::de::DeserializeOwned;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Reads the whole file as a string without interpreting it.
pub fn load_config_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.display().to_string(),
        source,
    })
}

/// Searches the usual locations for `filename`.
///
/// Order:
/// 1. `CONFIG_PATH` environment variable (if it points at an existing file)
/// 2. `./config/{filename}`
/// 3. `./{filename}`
pub fn find_config_file(filename: &str) -> Result<PathBuf> {
    if let Ok(path) = env::var("CONFIG_PATH") {
        let path_buf = PathBuf::from(&path);
        if path_buf.exists() {
            return Ok(path_buf);
        }
    }

    let candidates = [PathBuf::from("./config").join(filename), PathBuf::from("./").join(filename)];
    candidates
        .into_iter()
        .find(|candidate| candidate.exists())
        .ok_or_else(|| {
            ConfigError::FileNotFound(format!(
                "'{}' (searched CONFIG_PATH, ./config/{}, ./{})",
                filename, filename, filename
            ))
        })
}

/// Decodes a JSON document held in memory, e.g. from an environment variable.
pub fn from_json_str<T: DeserializeOwned>(origin: &str, json: &str) -> Result<T> {
    serde_json::from_str(json).map_err(|source| ConfigError::Parse {
        origin: origin.to_string(),
        source,
    })
}

/// Reads and decodes a JSON configuration file.
pub fn load_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    let content = load_config_file(path)?;
    from_json_str(&path.display().to_string(), &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Deserialize, Default, PartialEq)]
    #[serde(default)]
    struct Sample {
        port: u16,
        name: String,
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = load_config_file("/path/that/does/not/exist.json");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_find_nonexistent_file() {
        let result = find_config_file("file_that_definitely_does_not_exist_12345.json");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_json_with_partial_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"port": 9000}}"#).unwrap();

        let sample: Sample = load_json(file.path()).unwrap();
        assert_eq!(
            sample,
            Sample {
                port: 9000,
                name: String::new()
            }
        );
    }

    #[test]
    fn test_parse_error_names_origin() {
        let err = from_json_str::<Sample>("CONFIG env", "{not json").unwrap_err();
        assert!(err.to_string().contains("CONFIG env"));
    }
}
