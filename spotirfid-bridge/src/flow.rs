//! Request flow orchestration
//!
//! Play flow:
//! `Routed → ReaderResolved → ContentAware → TokenResolved → DeviceResolved → PlaybackStarted`
//!
//! Write flow:
//! `Routed → ReaderResolved → TokenResolved → SnapshotFetched → MappingWritten`
//!
//! Every step depends on the previous one, so the steps run strictly in
//! sequence. Any failure ends the request with `Failed(reason)`; nothing is
//! retried. Content is resolved before the token so an unmapped tag costs
//! no upstream call.

use crate::error::{BridgeError, BridgeResult};
use crate::spotify::CurrentlyPlaying;
use crate::{devices, playback, AppState};
use spotirfid_common::ReaderConfig;
use std::fmt;
use tracing::debug;

/// Per-request state machine positions, used for tracing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ReaderResolved,
    ContentAware,
    TokenResolved,
    DeviceResolved,
    PlaybackStarted,
    SnapshotFetched,
    MappingWritten,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

fn reached(reader_id: &str, stage: Stage) {
    debug!(reader_id, %stage, "flow stage reached");
}

/// Where the content reference for a play request comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource<'a> {
    /// Look the tag up in the reader's tag mappings
    Tag(&'a str),
    /// Album id (or full URI) supplied by the caller
    Direct(&'a str),
}

impl ContentSource<'_> {
    /// Resolve to a playable content reference
    pub async fn resolve(&self, state: &AppState, reader_id: &str) -> BridgeResult<String> {
        match *self {
            ContentSource::Tag(tag_id) => state
                .tags
                .get(reader_id, tag_id)
                .await?
                .ok_or_else(|| BridgeError::UnmappedTag(tag_id.to_string())),
            ContentSource::Direct(album_id) => Ok(album_uri(album_id)),
        }
    }
}

/// Content reference for a directly supplied album id
///
/// Bare ids become `spotify:album:{id}`; anything already shaped like a URI
/// is passed through.
pub fn album_uri(album_id: &str) -> String {
    if album_id.contains(':') {
        album_id.to_string()
    } else {
        format!("spotify:album:{album_id}")
    }
}

/// Bare album id from a snapshot album: its `id`, else the URI's last segment
fn album_id_of(uri: &str, id: Option<&str>) -> String {
    id.map(str::to_string)
        .unwrap_or_else(|| uri.rsplit(':').next().unwrap_or(uri).to_string())
}

/// Album currently playing for a reader's account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentAlbum {
    pub id: String,
    pub uri: String,
    pub name: String,
}

impl CurrentAlbum {
    fn from_snapshot(snapshot: Option<&CurrentlyPlaying>) -> BridgeResult<Self> {
        let album = snapshot
            .and_then(CurrentlyPlaying::album)
            .ok_or(BridgeError::NothingPlaying)?;
        // album() guarantees a non-empty uri
        let uri = album.uri.clone().unwrap_or_default();

        Ok(Self {
            id: album_id_of(&uri, album.id.as_deref()),
            name: album.name.clone().unwrap_or_else(|| uri.clone()),
            uri,
        })
    }
}

/// Sole authorization gate: unknown readers stop here
pub async fn resolve_reader(state: &AppState, reader_id: &str) -> BridgeResult<ReaderConfig> {
    let reader = state
        .readers
        .resolve(reader_id)
        .await?
        .ok_or(BridgeError::UnknownReader)?;
    reached(reader_id, Stage::ReaderResolved);
    Ok(reader)
}

/// Play flow. Returns the content reference that started playing.
pub async fn play(
    state: &AppState,
    reader_id: &str,
    source: ContentSource<'_>,
) -> BridgeResult<String> {
    let reader = resolve_reader(state, reader_id).await?;

    let content_ref = source.resolve(state, reader_id).await?;
    reached(reader_id, Stage::ContentAware);

    let token = state.tokens.access_token(reader_id, &reader).await?;
    reached(reader_id, Stage::TokenResolved);

    let device_id = devices::find_device_id(&state.spotify, &token, &reader.target_device)
        .await?
        .ok_or_else(|| BridgeError::DeviceNotFound(reader.target_device.clone()))?;
    reached(reader_id, Stage::DeviceResolved);

    playback::start_playback(&state.spotify, &token, &device_id, &content_ref).await?;
    reached(reader_id, Stage::PlaybackStarted);

    Ok(content_ref)
}

/// Fetch the album currently playing for a reader's account
pub async fn current_album(state: &AppState, reader_id: &str) -> BridgeResult<CurrentAlbum> {
    let reader = resolve_reader(state, reader_id).await?;

    let token = state.tokens.access_token(reader_id, &reader).await?;
    reached(reader_id, Stage::TokenResolved);

    let snapshot = playback::currently_playing(&state.spotify, &token).await?;
    reached(reader_id, Stage::SnapshotFetched);

    CurrentAlbum::from_snapshot(snapshot.as_ref())
}

/// Write flow: map `tag_id` to the album currently playing
pub async fn record_current_album(
    state: &AppState,
    reader_id: &str,
    tag_id: &str,
) -> BridgeResult<CurrentAlbum> {
    let album = current_album(state, reader_id).await?;

    state.tags.put(reader_id, tag_id, &album.uri).await?;
    reached(reader_id, Stage::MappingWritten);

    Ok(album)
}
