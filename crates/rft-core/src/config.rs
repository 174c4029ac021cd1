//! Process-wide configuration.
//!
//! Resolution order: environment variables -> config file -> defaults.
//!
//! Config file location:
//!   1. $RFT_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/rft/config.toml
//!   3. ~/.config/rft/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One mebibyte, the unit both `hash_chunk_size` and `transfer_chunk_size`
/// are expressed in multiples of.
pub const MIB: u64 = 1024 * 1024;

/// Top-level configuration. Both chunk sizes MUST match the peer's for a
/// session to interoperate; this struct does not enforce that across the
/// wire, it only supplies the local defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bytes per running-MD5 chunk during prefix validation. Default 5 MiB.
    pub hash_chunk_size: u64,
    /// Bytes per read/write during tail streaming. Default 5 MiB.
    pub transfer_chunk_size: u64,
    /// Whether to read/write the `<file>.hashlog` side-file.
    pub hash_log_enabled: bool,
    /// Default TCP port for both listener and dialer.
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hash_chunk_size: 5 * MIB,
            transfer_chunk_size: 5 * MIB,
            hash_log_enabled: false,
            port: 14605,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

impl Config {
    /// Load config: env vars -> file -> defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            Config::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("RFT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&Config::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply RFT_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("RFT_HASH_CHUNK_SIZE") {
            if let Ok(n) = v.parse() {
                self.hash_chunk_size = n;
            }
        }
        if let Ok(v) = std::env::var("RFT_TRANSFER_CHUNK_SIZE") {
            if let Ok(n) = v.parse() {
                self.transfer_chunk_size = n;
            }
        }
        if let Ok(v) = std::env::var("RFT_HASH_LOG") {
            self.hash_log_enabled = v == "true" || v == "1";
        }
        if let Ok(v) = std::env::var("RFT_PORT") {
            if let Ok(p) = v.parse() {
                self.port = p;
            }
        }
    }
}

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("rft")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}
