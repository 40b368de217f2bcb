// Player page and static assets, never cached by the browser

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};

use crate::http::{AppError, AppResult, AppState};

const NO_STORE: &str = "no-store";

pub async fn index(State(state): State<AppState>) -> AppResult<Response> {
    serve(&state, "index.html").await
}

pub async fn static_file(
    Path(file): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Response> {
    if !is_plain_file_name(&file) {
        return Err(AppError::not_found("Not found"));
    }
    serve(&state, &file).await
}

async fn serve(state: &AppState, file: &str) -> AppResult<Response> {
    let data = tokio::fs::read(state.static_dir.join(file))
        .await
        .map_err(|_| AppError::not_found("Not found"))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(file))
        .header(header::CACHE_CONTROL, NO_STORE)
        .body(Body::from(data))
        .map_err(|_| AppError::internal_server_error("Failed to build response"))
}

/// A single, non-hidden path component.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.contains('\0')
}

fn content_type_for(file: &str) -> &'static str {
    match file.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()).as_deref() {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_file_names() {
        assert!(is_plain_file_name("app.js"));
        assert!(!is_plain_file_name("../config.json"));
        assert!(!is_plain_file_name(".env"));
        assert!(!is_plain_file_name("a\\b.js"));
        assert!(!is_plain_file_name(""));
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for("index.html"), "text/html; charset=utf-8");
        assert_eq!(content_type_for("APP.JS"), "text/javascript; charset=utf-8");
        assert_eq!(content_type_for("blob"), "application/octet-stream");
    }
}
