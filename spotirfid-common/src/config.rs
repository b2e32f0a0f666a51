//! Configuration file loading and default locations
//!
//! Resolution priority for every setting (applied by the service binary):
//! 1. Command-line argument / environment variable (highest priority)
//! 2. TOML config file
//! 3. Compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default listen address for the bridge
pub const DEFAULT_BIND: &str = "127.0.0.1:8787";

/// Spotify accounts service (OAuth token endpoint host)
pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";

/// Spotify Web API host
pub const DEFAULT_API_URL: &str = "https://api.spotify.com";

/// Seconds shaved off the upstream token lifetime before caching
pub const DEFAULT_TOKEN_SAFETY_MARGIN_SECS: u64 = 60;

/// Contents of `config.toml`; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub bind: Option<String>,
    pub database: Option<PathBuf>,
    pub routes: Option<String>,
    pub accounts_url: Option<String>,
    pub api_url: Option<String>,
    pub token_safety_margin_secs: Option<u64>,
}

impl TomlConfig {
    /// Parse an explicit config file. Missing or invalid files are errors.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;

        let config = toml::from_str::<TomlConfig>(&content).map_err(|e| {
            Error::Config(format!("Invalid config file {}: {}", path.display(), e))
        })?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load the config file from its platform default location, if present
    ///
    /// A missing default file is not an error; the bridge runs from CLI,
    /// environment and compiled defaults alone.
    pub fn load_default() -> Result<Option<Self>> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path).map(Some),
            Some(path) => {
                debug!("No config file at {}", path.display());
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

/// Platform default config file: `<config dir>/spotirfid/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("spotirfid").join("config.toml"))
}

/// Platform default database file: `<local data dir>/spotirfid/spotirfid.db`
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("spotirfid"))
        .unwrap_or_else(|| PathBuf::from("./spotirfid_data"))
        .join("spotirfid.db")
}
