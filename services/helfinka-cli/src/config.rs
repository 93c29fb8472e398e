//! Configuration for the Helfinka CLI.

use std::path::PathBuf;

use helfinka_client::ClientConfig;

/// Directory name used under `$HOME` when `HELFINKA_DATA_DIR` is unset
const DEFAULT_DATA_DIR: &str = ".helfinka";

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API client configuration
    pub client: ClientConfig,

    /// Where the session, tag history and theme are kept
    pub data_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let client = ClientConfig::from_lookup(&lookup)?;

        let data_dir = match lookup("HELFINKA_DATA_DIR") {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            Some(_) => return Err(ConfigError::Invalid("HELFINKA_DATA_DIR")),
            None => lookup("HOME")
                .map(|home| PathBuf::from(home).join(DEFAULT_DATA_DIR))
                .ok_or(ConfigError::Missing("HELFINKA_DATA_DIR"))?,
        };

        Ok(Self { client, data_dir })
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error(transparent)]
    Client(#[from] helfinka_client::ConfigError),
}
