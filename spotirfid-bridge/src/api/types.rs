//! Request and response bodies of the flow endpoints
//!
//! Field names are camelCase on the wire to match the reader firmware.

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

// ========================================
// /api/scan
// ========================================

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub reader_id: String,
    pub tag_id: String,
    /// Absent means a normal (play) scan
    #[serde(default)]
    pub is_write_mode: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanAction {
    Play,
    Mapped,
    Error,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanResponse {
    pub success: bool,
    pub action: ScanAction,
    pub message: String,
}

impl ScanResponse {
    pub fn ok(action: ScanAction, message: String) -> Self {
        Self {
            success: true,
            action,
            message,
        }
    }

    pub fn failure(err: &BridgeError) -> Self {
        Self {
            success: false,
            action: ScanAction::Error,
            message: err.to_string(),
        }
    }
}

// ========================================
// /api/play-album
// ========================================

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayAlbumRequest {
    pub reader_id: String,
    pub album_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayAlbumResponse {
    pub success: bool,
    pub message: String,
}

impl PlayAlbumResponse {
    pub fn failure(err: &BridgeError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
        }
    }
}

// ========================================
// /api/current-album
// ========================================

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentAlbumRequest {
    pub reader_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentAlbumResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_name: Option<String>,
}

impl CurrentAlbumResponse {
    pub fn failure(err: &BridgeError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
            album_id: None,
            album_name: None,
        }
    }
}
