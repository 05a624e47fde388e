//! Document routes: upload, selection, extraction

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::processed::ProcessedResponse;
use crate::auth::Principal;
use crate::document::{Document, ProcessingStatus};
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::storage::MediaStore;

/// Multipart field names accepted for the PDF
const FILE_FIELDS: [&str; 2] = ["file", "original_file"];

/// Create the documents router
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/api/documents/",
            get(list_documents).post(upload_document),
        )
        .route(
            "/api/documents/:id/",
            get(get_document).delete(delete_document),
        )
        .route(
            "/api/documents/:id/page_selection/",
            patch(update_page_selection),
        )
        .route("/api/documents/:id/extract_text/", post(extract_text))
        .route("/api/documents/:id/status/", get(document_status))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

#[derive(Debug, Serialize)]
pub struct ThumbnailEntry {
    pub page_number: u32,
    /// Absent for pages past the thumbnail cap
    pub url: Option<String>,
    pub is_excluded: bool,
}

/// Full document representation
#[derive(Debug, Serialize)]
pub struct DocumentDetail {
    pub id: String,
    pub filename: String,
    pub uploaded_at: String,
    pub total_pages: u32,
    pub excluded_pages: Vec<u32>,
    pub thumbnails_ready: bool,
    pub status: ProcessingStatus,
    pub active_pages: Vec<u32>,
    pub active_pages_count: u32,
    pub excluded_pages_count: u32,
    pub version: i64,
    pub thumbnails: Vec<ThumbnailEntry>,
}

impl DocumentDetail {
    pub fn new(document: &Document, base_url: &str) -> Self {
        let thumbnails = (1..=document.total_pages)
            .map(|page| ThumbnailEntry {
                page_number: page,
                url: (document.thumbnails_ready && page <= document.thumbnail_count).then(|| {
                    super::media_url(base_url, &MediaStore::thumbnail_path(&document.id, page))
                }),
                is_excluded: document.is_excluded(page),
            })
            .collect();

        Self {
            id: document.id.clone(),
            filename: document.filename.clone(),
            uploaded_at: document.uploaded_at.clone(),
            total_pages: document.total_pages,
            excluded_pages: document.excluded_pages.clone(),
            thumbnails_ready: document.thumbnails_ready,
            status: document.status,
            active_pages: document.active_pages(),
            active_pages_count: document.active_pages_count(),
            excluded_pages_count: document.excluded_pages_count(),
            version: document.version,
            thumbnails,
        }
    }
}

/// List entry and nested representation
#[derive(Debug, Serialize)]
pub struct DocumentSummary {
    pub id: String,
    pub filename: String,
    pub uploaded_at: String,
    pub total_pages: u32,
    pub thumbnails_ready: bool,
    pub status: ProcessingStatus,
    pub active_pages_count: u32,
    pub excluded_pages_count: u32,
}

impl From<&Document> for DocumentSummary {
    fn from(document: &Document) -> Self {
        Self {
            id: document.id.clone(),
            filename: document.filename.clone(),
            uploaded_at: document.uploaded_at.clone(),
            total_pages: document.total_pages,
            thumbnails_ready: document.thumbnails_ready,
            status: document.status,
            active_pages_count: document.active_pages_count(),
            excluded_pages_count: document.excluded_pages_count(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PageSelectionRequest {
    pub excluded_pages: Vec<i64>,
    #[serde(default)]
    pub version: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: ProcessingStatus,
    pub thumbnails_ready: bool,
    pub total_pages: u32,
}

async fn upload_document(
    State(state): State<AppState>,
    principal: Principal,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentDetail>)> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("Failed to read multipart field: {}", e);
        AppError::Validation(format!("Failed to read upload: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();
        if !FILE_FIELDS.contains(&name.as_str()) {
            tracing::debug!(field = %name, "Ignoring multipart field");
            continue;
        }

        let filename = field.file_name().unwrap_or("").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read file data: {}", e)))?;

        let document = state
            .processor()
            .upload(&principal, &filename, &data)
            .await?;
        let detail = DocumentDetail::new(&document, &state.config().server.public_base_url);
        return Ok((StatusCode::CREATED, Json(detail)));
    }

    Err(AppError::Validation(
        "No file provided. Use field name 'file' or 'original_file'".to_string(),
    ))
}

async fn list_documents(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Vec<DocumentSummary>>> {
    let documents = state.processor().list(&principal).await?;
    Ok(Json(documents.iter().map(DocumentSummary::from).collect()))
}

async fn get_document(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<DocumentDetail>> {
    let document = state.processor().get(&principal, &id).await?;
    Ok(Json(DocumentDetail::new(
        &document,
        &state.config().server.public_base_url,
    )))
}

async fn delete_document(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.processor().delete(&principal, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_page_selection(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    body: std::result::Result<Json<PageSelectionRequest>, JsonRejection>,
) -> Result<Json<DocumentDetail>> {
    let Json(body) = body?;
    let document = state
        .processor()
        .update_page_selection(&principal, &id, &body.excluded_pages, body.version)
        .await?;
    Ok(Json(DocumentDetail::new(
        &document,
        &state.config().server.public_base_url,
    )))
}

async fn extract_text(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<ProcessedResponse>> {
    let processed = state.processor().extract_text(&principal, &id).await?;
    let document = state.processor().get(&principal, &id).await?;
    Ok(Json(ProcessedResponse::new(
        &processed,
        &document,
        &state.config().server.public_base_url,
    )))
}

async fn document_status(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>> {
    let document = state.processor().get(&principal, &id).await?;
    Ok(Json(StatusResponse {
        status: document.status,
        thumbnails_ready: document.thumbnails_ready,
        total_pages: document.total_pages,
    }))
}
