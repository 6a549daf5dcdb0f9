//! Configuration primitives for weft tooling.
//!
//! Parses the TOML-based `~/.weft/config.toml` (and project-scoped
//! variants) so the loader and future tooling share one schema for fetch
//! behaviour and model defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dirs::home_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub(crate) type Result<T> = std::result::Result<T, ConfigError>;

/// Application configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WeftConfig {
    /// Remote fetch behaviour.
    pub fetch: FetchConfig,

    /// Model defaults.
    pub model: ModelConfig,
}

/// Remote fetch behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Environment variable the bearer token for authenticated fetches is
    /// read from.
    pub token_env: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            token_env: "WEFT_AUTH_TOKEN".to_string(),
        }
    }
}

/// Model defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ModelConfig {
    /// Model assigned to tools that declare none; falls back to the
    /// built-in registry default when unset.
    pub default: Option<String>,
}

impl WeftConfig {
    /// Loads configuration from the given path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
        toml::from_str::<WeftConfig>(&contents).map_err(ConfigError::Parse)
    }

    /// Returns the default configuration path (`$HOME/.weft/config.toml`).
    pub fn default_path() -> Result<PathBuf> {
        let home = home_dir().ok_or(ConfigError::HomeDirMissing)?;
        Ok(home.join(".weft").join("config.toml"))
    }

    /// Load configuration from the default location, or the defaults when
    /// no file exists there.
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// Load configuration for the current working directory, preferring a
    /// project-level `.weft/config.toml` over the global one.
    pub fn load_scoped() -> Result<Self> {
        if let Some(path) = project_config_path() {
            return Self::from_file(path);
        }
        Self::load_default()
    }
}

fn project_config_path() -> Option<PathBuf> {
    let cwd = env::current_dir().ok()?;
    for ancestor in cwd.ancestors() {
        let candidate = ancestor.join(".weft").join("config.toml");
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

/// Errors that can occur while reading weft configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO failure when reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Unable to determine home directory for default config path")]
    HomeDirMissing,
}
