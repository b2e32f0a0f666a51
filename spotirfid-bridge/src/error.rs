//! Error types for spotirfid-bridge
//!
//! Every failure of a request flow is a [`BridgeError`]. Handlers turn it
//! into a `success: false` body; [`BridgeError::status`] picks the HTTP code:
//! - business failures (unknown reader, unmapped tag, device not found,
//!   nothing playing) → 200
//! - malformed request body → 400
//! - upstream and storage faults → 500

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// Reader config absent or unparseable
    #[error("Invalid reader ID")]
    UnknownReader,

    /// Play flow: no content stored for this tag
    #[error("Tag {0} not mapped to any Spotify URI")]
    UnmappedTag(String),

    /// OAuth refresh-token exchange returned a non-success status
    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    /// No device with exactly this display name
    #[error("Device \"{0}\" not found")]
    DeviceNotFound(String),

    /// Device-list call returned a non-success status
    #[error("Get devices failed: {0}")]
    DeviceListFailed(String),

    /// Write flow / album query: snapshot has no album
    #[error("No album currently playing")]
    NothingPlaying,

    /// Start-playback call rejected; carries the upstream body
    #[error("Start playback failed: {0}")]
    PlaybackStartFailed(String),

    /// Currently-playing call returned a non-success status
    #[error("Get currently playing failed: {0}")]
    CurrentlyPlayingFetchFailed(String),

    /// Inbound JSON body could not be decoded
    #[error("Malformed request body: {0}")]
    MalformedRequestBody(String),

    /// Transport or decoding failure talking to Spotify
    #[error("Upstream request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Durable store failure
    #[error(transparent)]
    Storage(#[from] spotirfid_common::Error),
}

impl BridgeError {
    /// Whether this is an expected, user-facing outcome rather than a fault
    pub fn is_business_failure(&self) -> bool {
        matches!(
            self,
            BridgeError::UnknownReader
                | BridgeError::UnmappedTag(_)
                | BridgeError::DeviceNotFound(_)
                | BridgeError::NothingPlaying
        )
    }

    /// HTTP status for the failure response
    pub fn status(&self) -> StatusCode {
        match self {
            e if e.is_business_failure() => StatusCode::OK,
            BridgeError::MalformedRequestBody(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Result type for flow operations
pub type BridgeResult<T> = Result<T, BridgeError>;
