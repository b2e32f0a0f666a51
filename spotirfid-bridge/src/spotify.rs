//! Spotify upstream client
//!
//! Owns the shared `reqwest` client and the two upstream hosts (accounts
//! service for OAuth, Web API for player control). Wire types for the four
//! consumed endpoints live here; the token cache, device resolver and
//! playback controller build their calls on top.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

const USER_AGENT: &str = concat!("spotirfid-bridge/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// OAuth client credentials shared by every reader
///
/// Loaded once at startup and never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Handle on the Spotify accounts service and Web API
#[derive(Clone, Debug)]
pub struct SpotifyClient {
    http: reqwest::Client,
    accounts_url: String,
    api_url: String,
}

impl SpotifyClient {
    /// Create a client for the given base URLs (no trailing path)
    pub fn new(accounts_url: &str, api_url: &str) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self::with_client(http, accounts_url, api_url))
    }

    /// Wrap an existing `reqwest::Client`
    pub fn with_client(http: reqwest::Client, accounts_url: &str, api_url: &str) -> Self {
        Self {
            http,
            accounts_url: accounts_url.trim_end_matches('/').to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// OAuth token endpoint
    pub fn token_url(&self) -> String {
        format!("{}/api/token", self.accounts_url)
    }

    /// Web API endpoint for a `/v1/...` path
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/v1{}", self.api_url, path)
    }
}

/// Status text carried in upstream failure messages, e.g. "Bad Request"
pub fn status_text(status: reqwest::StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_u16().to_string())
}

// ========================================
// Wire types
// ========================================

/// Response of the refresh-token grant
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Entry of `GET /v1/me/player/devices`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Device {
    /// Null for devices that cannot be targeted through the Web API
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type", default)]
    pub device_type: String,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceList {
    #[serde(default)]
    pub devices: Vec<Device>,
}

/// Body of `GET /v1/me/player/currently-playing`
///
/// Only the album part of the playing item is modelled.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CurrentlyPlaying {
    #[serde(default)]
    pub item: Option<PlayingItem>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlayingItem {
    #[serde(default)]
    pub album: Option<AlbumRef>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AlbumRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl CurrentlyPlaying {
    /// Album of the playing item, if the snapshot names one with a URI
    pub fn album(&self) -> Option<&AlbumRef> {
        self.item
            .as_ref()?
            .album
            .as_ref()
            .filter(|album| album.uri.as_deref().is_some_and(|uri| !uri.is_empty()))
    }
}
