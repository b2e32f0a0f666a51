//! POST /api/play-album and POST /api/current-album
//!
//! The direct-id deployment: the reader stores album ids on its tags itself
//! and only needs playback and a way to read what is playing.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

use super::report_failure;
use super::types::{
    CurrentAlbumRequest, CurrentAlbumResponse, PlayAlbumRequest, PlayAlbumResponse,
};
use crate::error::BridgeError;
use crate::flow::{self, ContentSource};
use crate::AppState;

pub async fn play_album(
    State(state): State<AppState>,
    body: Result<Json<PlayAlbumRequest>, JsonRejection>,
) -> (StatusCode, Json<PlayAlbumResponse>) {
    const ENDPOINT: &str = "/api/play-album";

    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            let err = BridgeError::MalformedRequestBody(rejection.body_text());
            report_failure(ENDPOINT, "", &err);
            return (err.status(), Json(PlayAlbumResponse::failure(&err)));
        }
    };

    match flow::play(&state, &req.reader_id, ContentSource::Direct(&req.album_id)).await {
        Ok(uri) => (
            StatusCode::OK,
            Json(PlayAlbumResponse {
                success: true,
                message: format!("Playing {uri}"),
            }),
        ),
        Err(err) => {
            report_failure(ENDPOINT, &req.reader_id, &err);
            (err.status(), Json(PlayAlbumResponse::failure(&err)))
        }
    }
}

pub async fn current_album(
    State(state): State<AppState>,
    body: Result<Json<CurrentAlbumRequest>, JsonRejection>,
) -> (StatusCode, Json<CurrentAlbumResponse>) {
    const ENDPOINT: &str = "/api/current-album";

    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            let err = BridgeError::MalformedRequestBody(rejection.body_text());
            report_failure(ENDPOINT, "", &err);
            return (err.status(), Json(CurrentAlbumResponse::failure(&err)));
        }
    };

    match flow::current_album(&state, &req.reader_id).await {
        Ok(album) => (
            StatusCode::OK,
            Json(CurrentAlbumResponse {
                success: true,
                message: format!("Currently playing album: {}", album.name),
                album_id: Some(album.id),
                album_name: Some(album.name),
            }),
        ),
        Err(err) => {
            report_failure(ENDPOINT, &req.reader_id, &err);
            (err.status(), Json(CurrentAlbumResponse::failure(&err)))
        }
    }
}
