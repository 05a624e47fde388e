//! HTTP routes

pub mod auth;
pub mod documents;
pub mod files;
pub mod health;
pub mod legacy;
pub mod processed;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Absolute URL of a stored media file
pub fn media_url(base_url: &str, relative: &str) -> String {
    format!("{}/media/{}", base_url.trim_end_matches('/'), relative)
}

/// Build the full application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        .merge(documents::router(state.config().server.max_upload_bytes))
        .merge(processed::router())
        .merge(auth::router())
        .merge(legacy::router())
        .nest("/media", files::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
