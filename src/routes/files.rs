//! Media file serving
//!
//! Serves thumbnails and audio from the local media root.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
    routing::get,
    Router,
};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Create the media router
pub fn router() -> Router<AppState> {
    Router::new().route("/*path", get(serve_file))
}

async fn serve_file(State(state): State<AppState>, Path(path): Path<String>) -> Result<Response> {
    let not_found = || AppError::NotFound(format!("File not found: {}", path));

    let full_path = state.media().resolve(&path).ok_or_else(not_found)?;
    let bytes = match tokio::fs::read(&full_path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
        Err(e) => return Err(e.into()),
    };

    let content_type = mime_guess::from_path(&full_path)
        .first_or_octet_stream()
        .to_string();
    let filename = path.rsplit('/').next().unwrap_or(&path);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, bytes.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", filename),
        )
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(e.to_string()))
}
