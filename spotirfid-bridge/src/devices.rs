//! Device resolver
//!
//! Maps a device display name to the id Spotify currently assigns it.
//! Matching is exact and case-sensitive; the first match wins and
//! `is_active` plays no part.

use crate::error::{BridgeError, BridgeResult};
use crate::spotify::{status_text, Device, DeviceList, SpotifyClient};
use tracing::{debug, warn};

/// Look up the id of the device called `device_name`
pub async fn find_device_id(
    spotify: &SpotifyClient,
    access_token: &str,
    device_name: &str,
) -> BridgeResult<Option<String>> {
    let response = spotify
        .http()
        .get(spotify.api_url("/me/player/devices"))
        .bearer_auth(access_token)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        warn!(status = status.as_u16(), "device list request rejected");
        return Err(BridgeError::DeviceListFailed(status_text(status)));
    }

    let list: DeviceList = response.json().await?;
    debug!(devices = list.devices.len(), "device list fetched");

    Ok(match_device(&list.devices, device_name).map(str::to_string))
}

/// First targetable device whose name equals `device_name` exactly
pub fn match_device<'a>(devices: &'a [Device], device_name: &str) -> Option<&'a str> {
    devices
        .iter()
        .filter(|device| device.name == device_name)
        .find_map(|device| device.id.as_deref())
}
