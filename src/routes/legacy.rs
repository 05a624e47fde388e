//! Retired page-based endpoints
//!
//! The old form workflow answers 410 Gone and points at its API replacement.

use axum::{http::StatusCode, routing::any, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct GoneResponse {
    pub error: &'static str,
    pub message: &'static str,
    pub replacement: &'static str,
}

fn gone(replacement: &'static str) -> (StatusCode, Json<GoneResponse>) {
    (
        StatusCode::GONE,
        Json(GoneResponse {
            error: "gone",
            message: "This endpoint has been retired. Use the JSON API instead.",
            replacement,
        }),
    )
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload/", any(|| async { gone("POST /api/documents/") }))
        .route(
            "/select/:id/",
            any(|| async { gone("PATCH /api/documents/{id}/page_selection/") }),
        )
        .route(
            "/edit/:id/",
            any(|| async { gone("PATCH /api/processed/{id}/update_text/") }),
        )
        .route(
            "/generate/:id/",
            any(|| async { gone("POST /api/processed/{id}/generate_audio/") }),
        )
        .route(
            "/play/:id/",
            any(|| async { gone("GET /api/processed/{id}/") }),
        )
}
