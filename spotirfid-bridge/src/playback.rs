//! Playback controller
//!
//! Start playback of a content reference on a device, and read the
//! currently-playing snapshot.

use crate::error::{BridgeError, BridgeResult};
use crate::spotify::{status_text, CurrentlyPlaying, SpotifyClient};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Whether a content reference names a playable collection
///
/// Albums and playlists are sent as a context so Spotify queues the whole
/// collection; anything else is sent as a single item.
pub fn is_context_uri(content_ref: &str) -> bool {
    content_ref.contains(":album:") || content_ref.contains(":playlist:")
}

/// Body of `PUT /v1/me/player/play`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayBody {
    pub device_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uris: Option<Vec<String>>,
}

impl PlayBody {
    pub fn for_content(device_id: &str, content_ref: &str) -> Self {
        let (context_uri, uris) = if is_context_uri(content_ref) {
            (Some(content_ref.to_string()), None)
        } else {
            (None, Some(vec![content_ref.to_string()]))
        };

        Self {
            device_id: device_id.to_string(),
            context_uri,
            uris,
        }
    }
}

/// Start playing `content_ref` on `device_id`
///
/// Any 2xx (including 204 No Content) is success. Other statuses fail with
/// the upstream body as diagnostic text.
pub async fn start_playback(
    spotify: &SpotifyClient,
    access_token: &str,
    device_id: &str,
    content_ref: &str,
) -> BridgeResult<()> {
    let body = PlayBody::for_content(device_id, content_ref);
    debug!(
        device_id,
        context = body.context_uri.is_some(),
        "starting playback"
    );

    let response = spotify
        .http()
        .put(spotify.api_url("/me/player/play"))
        .query(&[("device_id", device_id)])
        .bearer_auth(access_token)
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let error = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "start playback rejected");
        return Err(BridgeError::PlaybackStartFailed(error));
    }

    info!(device_id, content_ref, "playback started");
    Ok(())
}

/// Fetch the currently-playing snapshot
///
/// `Ok(None)` means nothing is playing (204, or an empty body).
pub async fn currently_playing(
    spotify: &SpotifyClient,
    access_token: &str,
) -> BridgeResult<Option<CurrentlyPlaying>> {
    let response = spotify
        .http()
        .get(spotify.api_url("/me/player/currently-playing"))
        .bearer_auth(access_token)
        .send()
        .await?;

    let status = response.status();
    if status == reqwest::StatusCode::NO_CONTENT {
        debug!("nothing currently playing");
        return Ok(None);
    }
    if !status.is_success() {
        warn!(status = status.as_u16(), "currently playing request rejected");
        return Err(BridgeError::CurrentlyPlayingFetchFailed(status_text(status)));
    }

    let bytes = response.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice::<CurrentlyPlaying>(&bytes)
        .map(Some)
        .map_err(|e| BridgeError::CurrentlyPlayingFetchFailed(format!("invalid snapshot: {e}")))
}
