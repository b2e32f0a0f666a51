//! Process-wide settings
//!
//! Merges command-line/environment overrides with the optional TOML file
//! and compiled defaults. The result is immutable for the life of the
//! process.

use crate::spotify::ClientCredentials;
use spotirfid_common::config::{
    default_database_path, TomlConfig, DEFAULT_ACCOUNTS_URL, DEFAULT_API_URL, DEFAULT_BIND,
    DEFAULT_TOKEN_SAFETY_MARGIN_SECS,
};
use spotirfid_common::{Error, Result};
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Which request shapes the router exposes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RouteMode {
    /// `/api/scan` only (tag-indirect deployment)
    Scan,
    /// `/api/play-album` and `/api/current-album` (direct album id deployment)
    Album,
    /// Every endpoint
    #[default]
    All,
}

impl RouteMode {
    pub fn serves_scan(&self) -> bool {
        matches!(self, RouteMode::Scan | RouteMode::All)
    }

    pub fn serves_album(&self) -> bool {
        matches!(self, RouteMode::Album | RouteMode::All)
    }
}

impl FromStr for RouteMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scan" => Ok(RouteMode::Scan),
            "album" => Ok(RouteMode::Album),
            "all" => Ok(RouteMode::All),
            other => Err(Error::Config(format!(
                "Unknown routes value '{}' (expected scan, album or all)",
                other
            ))),
        }
    }
}

impl fmt::Display for RouteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RouteMode::Scan => "scan",
            RouteMode::Album => "album",
            RouteMode::All => "all",
        })
    }
}

/// Values supplied on the command line or through environment variables
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub bind: Option<String>,
    pub database: Option<PathBuf>,
    pub routes: Option<String>,
}

/// Fully resolved settings for the bridge service
#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials: ClientCredentials,
    pub bind: SocketAddr,
    pub database: PathBuf,
    pub routes: RouteMode,
    pub accounts_url: String,
    pub api_url: String,
    pub token_safety_margin: Duration,
}

/// Database location: override > file > platform default
pub fn resolve_database_path(overrides: &Overrides, file: Option<&TomlConfig>) -> PathBuf {
    overrides
        .database
        .clone()
        .or_else(|| file.and_then(|f| f.database.clone()))
        .unwrap_or_else(default_database_path)
}

fn pick(cli: &Option<String>, file: Option<&Option<String>>) -> Option<String> {
    cli.clone()
        .or_else(|| file.cloned().flatten())
        .filter(|value| !value.trim().is_empty())
}

impl Settings {
    pub fn resolve(overrides: Overrides, file: Option<TomlConfig>) -> Result<Self> {
        let file = file.as_ref();

        let client_id = pick(&overrides.client_id, file.map(|f| &f.client_id))
            .ok_or_else(|| Error::Config("SPOTIFY_CLIENT_ID is required".to_string()))?;
        let client_secret = pick(&overrides.client_secret, file.map(|f| &f.client_secret))
            .ok_or_else(|| Error::Config("SPOTIFY_CLIENT_SECRET is required".to_string()))?;

        let bind = pick(&overrides.bind, file.map(|f| &f.bind))
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind
            .parse::<SocketAddr>()
            .map_err(|e| Error::Config(format!("Invalid bind address '{}': {}", bind, e)))?;

        let routes = match pick(&overrides.routes, file.map(|f| &f.routes)) {
            Some(value) => value.parse()?,
            None => RouteMode::default(),
        };

        let accounts_url = file
            .and_then(|f| f.accounts_url.clone())
            .unwrap_or_else(|| DEFAULT_ACCOUNTS_URL.to_string());
        let api_url = file
            .and_then(|f| f.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let token_safety_margin = Duration::from_secs(
            file.and_then(|f| f.token_safety_margin_secs)
                .unwrap_or(DEFAULT_TOKEN_SAFETY_MARGIN_SECS),
        );

        Ok(Self {
            credentials: ClientCredentials::new(client_id, client_secret),
            bind,
            database: resolve_database_path(&overrides, file),
            routes,
            accounts_url,
            api_url,
            token_safety_margin,
        })
    }
}
