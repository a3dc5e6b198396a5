//! Bootstrap configuration loading
//!
//! Configuration file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `CONNBOARD_CONFIG` environment variable
//! 3. Platform config file (`~/.config/connboard/config.toml`, then
//!    `/etc/connboard/config.toml` on Linux)
//! 4. Compiled defaults (fallback)
//!
//! A missing or broken file never stops startup: the caller gets defaults
//! plus a [`ConfigSource`] describing what happened so it can be logged once
//! tracing is up.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "CONNBOARD_CONFIG";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5790;

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Address the HTTP surface binds to
    pub bind_address: String,

    pub port: u16,

    /// Bearer token required for operator commands; `None` disables the check
    pub operator_token: Option<String>,

    /// Fixed UTC offset in minutes for day and month boundaries; host local
    /// time when unset
    pub utc_offset_minutes: Option<i32>,

    pub logging: LoggingConfig,
    pub rotation: RotationConfig,
    pub notifier: NotifierConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            bind_address: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            operator_token: None,
            utc_offset_minutes: None,
            logging: LoggingConfig::default(),
            rotation: RotationConfig::default(),
            notifier: NotifierConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` overrides it
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Monthly rotation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RotationConfig {
    pub enabled: bool,

    /// Process the previous month once at startup
    pub catch_up_on_start: bool,

    /// Longest single sleep before the wall clock is read again
    pub max_sleep_secs: u64,

    /// Communities processed concurrently during a firing
    pub concurrency: usize,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            catch_up_on_start: true,
            max_sleep_secs: 3600,
            concurrency: 4,
        }
    }
}

/// Announcement delivery settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NotifierConfig {
    pub timeout_ms: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self { timeout_ms: 10_000 }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig =
            toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.rotation.max_sleep_secs == 0 {
            return Err(Error::Config("rotation.max_sleep_secs must be at least 1".to_string()));
        }
        if self.rotation.concurrency == 0 {
            return Err(Error::Config("rotation.concurrency must be at least 1".to_string()));
        }
        if let Some(minutes) = self.utc_offset_minutes {
            if minutes.abs() >= 24 * 60 {
                return Err(Error::Config(format!(
                    "utc_offset_minutes out of range: {}",
                    minutes
                )));
            }
        }
        Ok(())
    }
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
    /// File was found but could not be used; defaults applied
    Fallback { path: PathBuf, error: String },
}

/// Resolve the config file path following the priority order
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config file
    platform_config_candidates()
        .into_iter()
        .find(|candidate| candidate.exists())
}

/// Load configuration, degrading to defaults instead of failing
pub fn load_config(cli_arg: Option<&Path>) -> (TomlConfig, ConfigSource) {
    match resolve_config_path(cli_arg) {
        None => (TomlConfig::default(), ConfigSource::Defaults),
        Some(path) => match TomlConfig::load(&path) {
            Ok(config) => (config, ConfigSource::File(path)),
            Err(e) => (
                TomlConfig::default(),
                ConfigSource::Fallback {
                    path,
                    error: e.to_string(),
                },
            ),
        },
    }
}

fn platform_config_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("connboard").join("config.toml"));
    }
    if cfg!(target_os = "linux") {
        candidates.push(PathBuf::from("/etc/connboard/config.toml"));
    }
    candidates
}

/// OS-dependent default database location
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("connboard").join("connboard.db"))
        .unwrap_or_else(|| PathBuf::from("./connboard_data/connboard.db"))
}
