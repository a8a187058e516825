//! Configuration loading for vaultsync.
//!
//! Configuration is loaded from a TOML file (default:
//! `<vault>/.vaultsync/config.toml`). Every section and field is optional.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use vaultsync_core::{ConflictPolicy, DEFAULT_PORT};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Server (listener) configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Client (initiator) configuration.
    #[serde(default)]
    pub client: ClientConfig,
    /// Vault scanning configuration.
    #[serde(default)]
    pub vault: VaultConfig,
    /// HTTP limits.
    #[serde(default)]
    pub http: HttpConfig,
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the listener (default: 0.0.0.0:27125).
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Flat session lifetime in seconds (default: 30). Activity does not
    /// extend it.
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: u64,
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Port of the remote service (default: 27125).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// How to settle paths changed on both sides (default: prefer-remote).
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
}

/// Vault scanning configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// File or directory names skipped at any depth.
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
}

/// HTTP limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Largest accepted request body in bytes (default: 256 MiB).
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

// Default value functions
fn default_bind_address() -> String {
    format!("0.0.0.0:{}", DEFAULT_PORT)
}

fn default_session_timeout_secs() -> u64 {
    30
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_ignore() -> Vec<String> {
    vec![".git".to_string(), ".trash".to_string()]
}

fn default_max_body_bytes() -> usize {
    256 * 1024 * 1024 // 256 MiB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            session_timeout_secs: default_session_timeout_secs(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
            conflict_policy: ConflictPolicy::default(),
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            ignore: default_ignore(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// Session lifetime as a duration.
    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }
}

impl ClientConfig {
    /// Request timeout as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Like [`Config::from_file`], but a missing file yields defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::from_file(path) {
            Err(ConfigError::ReadError { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::SerializeError)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// Failed to render configuration.
    #[error("failed to serialize config: {0}")]
    SerializeError(toml::ser::Error),
}
