//! Runtime configuration for the cardwall CLI.
//!
//! Settings layer in rising precedence: built-in defaults, the config
//! file (`<config dir>/cardwall/config.toml`), `CARDWALL_*` environment
//! variables, then command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The config.toml structure. Every field is optional; missing values
/// fall through to the environment and the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl ConfigFile {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config.toml")
    }

    /// Load from `path`, or return defaults when the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub state_dir: PathBuf,
    pub request_timeout: Duration,
}

impl Config {
    /// Resolve settings from the parsed file, the environment, and the
    /// CLI flag.
    pub fn resolve(file: ConfigFile, cli_base_url: Option<String>) -> Result<Self> {
        let base_url = cli_base_url
            .or_else(|| std::env::var("CARDWALL_BASE_URL").ok())
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let state_dir = match std::env::var("CARDWALL_STATE_DIR")
            .ok()
            .map(PathBuf::from)
            .or(file.state_dir)
        {
            Some(dir) => dir,
            None => default_state_dir()?,
        };

        let timeout_secs = std::env::var("CARDWALL_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(file.request_timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            base_url,
            state_dir,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Load the file from the default location and resolve.
    pub fn load(cli_base_url: Option<String>) -> Result<Self> {
        let file = ConfigFile::load_or_default(&default_config_path()?)?;
        Self::resolve(file, cli_base_url)
    }

    /// Path of the key-value state file inside the state directory.
    pub fn state_file(&self) -> PathBuf {
        self.state_dir.join("state.json")
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine the user config directory"))?;
    Ok(dir.join("cardwall").join("config.toml"))
}

fn default_state_dir() -> Result<PathBuf> {
    let dir = dirs::data_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine the user data directory"))?;
    Ok(dir.join("cardwall"))
}
