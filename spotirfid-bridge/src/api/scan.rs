//! POST /api/scan: tag scans from a reader
//!
//! A normal scan plays whatever the tag is mapped to; a write-mode scan maps
//! the tag to the album currently playing.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

use super::report_failure;
use super::types::{ScanAction, ScanRequest, ScanResponse};
use crate::error::BridgeError;
use crate::flow::{self, ContentSource};
use crate::AppState;

const ENDPOINT: &str = "/api/scan";

pub async fn scan(
    State(state): State<AppState>,
    body: Result<Json<ScanRequest>, JsonRejection>,
) -> (StatusCode, Json<ScanResponse>) {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            let err = BridgeError::MalformedRequestBody(rejection.body_text());
            report_failure(ENDPOINT, "", &err);
            return (err.status(), Json(ScanResponse::failure(&err)));
        }
    };

    let result = if req.is_write_mode {
        flow::record_current_album(&state, &req.reader_id, &req.tag_id)
            .await
            .map(|album| {
                ScanResponse::ok(
                    ScanAction::Mapped,
                    format!("Mapped tag {} to album: {}", req.tag_id, album.name),
                )
            })
    } else {
        flow::play(&state, &req.reader_id, ContentSource::Tag(&req.tag_id))
            .await
            .map(|uri| ScanResponse::ok(ScanAction::Play, format!("Playing {uri}")))
    };

    match result {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(err) => {
            report_failure(ENDPOINT, &req.reader_id, &err);
            (err.status(), Json(ScanResponse::failure(&err)))
        }
    }
}
