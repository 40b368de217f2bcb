//! HLS output
//!
//! GET /hls/{name} serves the playlist and segments straight from the output
//! directory. Only names the relay itself produces are served; anything else,
//! including encoded traversal attempts, is a 404.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use hlsrelay_core::supervisor::artifacts::{is_playlist_name, is_segment_name};
use tracing::debug;

use crate::http::{AppError, AppResult, AppState};

const PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";
const SEGMENT_CONTENT_TYPE: &str = "video/mp2t";
const HLS_CACHE_CONTROL: &str = "public, max-age=2";

pub async fn serve_artifact(
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Response> {
    let content_type = if is_playlist_name(&name) {
        PLAYLIST_CONTENT_TYPE
    } else if is_segment_name(&name) {
        SEGMENT_CONTENT_TYPE
    } else {
        debug!(name = %name, "Rejected HLS request");
        return Err(AppError::not_found("Not found"));
    };

    let path = state
        .relay
        .supervisor()
        .housekeeper()
        .dir()
        .join(&name);
    let data = tokio::fs::read(&path)
        .await
        .map_err(|_| AppError::not_found("Not found"))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, HLS_CACHE_CONTROL)
        .body(Body::from(data))
        .map_err(|_| AppError::internal_server_error("Failed to build response"))
}
