//! Configuration system for canseal.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $CANSEAL_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/canseal/config.toml
//!   3. ~/.config/canseal/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CansealConfig {
    pub identity: IdentityConfig,
    pub bus: BusConfig,
    pub api: ApiConfig,
    pub guard: GuardConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Path to the shared 16-byte key (hex). Auto-generated on first run;
    /// copy it to the peer out-of-band.
    pub key_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// UDP address this daemon receives transport units on.
    pub bind_addr: String,
    /// UDP address outbound units are sent to.
    pub peer_addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// HTTP command dispatcher port.
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Accept a large backward counter jump near zero as a sender
    /// restart. A heuristic an attacker can probe; disable where the
    /// sender never restarts its counter.
    pub rebaseline: bool,
    /// Duplicate suppression window in milliseconds.
    pub duplicate_window_ms: u64,
    /// Entries kept for duplicate suppression.
    pub recent_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for persisted counters.
    pub data_dir: PathBuf,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

impl Default for CansealConfig {
    fn default() -> Self {
        Self {
            identity: IdentityConfig::default(),
            bus: BusConfig::default(),
            api: ApiConfig::default(),
            guard: GuardConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            key_path: config_dir().join("key"),
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:29400".to_string(),
            peer_addr: "127.0.0.1:29401".to_string(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { port: 5000 }
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            rebaseline: true,
            duplicate_window_ms: 300,
            recent_capacity: 20,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: data_dir(),
        }
    }
}

// ── Path helpers ─────────────────────────────────────────────────────────────

pub fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("canseal")
}

pub fn data_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".local").join("share"))
        .join("canseal")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ───────────────────────────────────────────────────────────────────

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

// ── Loading ──────────────────────────────────────────────────────────────────

impl CansealConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            CansealConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("CANSEAL_CONFIG")
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
            let text = toml::to_string_pretty(&CansealConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text)
                .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply CANSEAL_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("CANSEAL_BUS__BIND_ADDR") {
            self.bus.bind_addr = v;
        }
        if let Ok(v) = std::env::var("CANSEAL_BUS__PEER_ADDR") {
            self.bus.peer_addr = v;
        }
        if let Ok(v) = std::env::var("CANSEAL_API__PORT") {
            if let Ok(p) = v.parse() {
                self.api.port = p;
            }
        }
        if let Ok(v) = std::env::var("CANSEAL_GUARD__REBASELINE") {
            self.guard.rebaseline = v == "true" || v == "1";
        }
        if let Ok(v) = std::env::var("CANSEAL_STORAGE__DATA_DIR") {
            self.storage.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("CANSEAL_IDENTITY__KEY_PATH") {
            self.identity.key_path = PathBuf::from(v);
        }
    }
}
