//! Processed document routes: text edits and audio

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::documents::DocumentSummary;
use crate::auth::Principal;
use crate::document::{AudioStatus, Document, ProcessedDocument};
use crate::error::Result;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/processed/", get(list_processed))
        .route("/api/processed/:id/", get(get_processed))
        .route("/api/processed/:id/update_text/", patch(update_text))
        .route("/api/processed/:id/generate_audio/", post(generate_audio))
}

#[derive(Debug, Serialize)]
pub struct ProcessedResponse {
    pub id: String,
    pub document: DocumentSummary,
    pub extracted_text: String,
    pub edited_text: Option<String>,
    /// URL of the narration, once synthesized
    pub audio_file: Option<String>,
    pub audio_status: AudioStatus,
    pub created_at: String,
    pub updated_at: String,
    pub source_excluded_pages: Vec<u32>,
}

impl ProcessedResponse {
    pub fn new(processed: &ProcessedDocument, document: &Document, base_url: &str) -> Self {
        Self {
            id: processed.id.clone(),
            document: DocumentSummary::from(document),
            extracted_text: processed.extracted_text.clone(),
            edited_text: processed.edited_text.clone(),
            audio_file: processed
                .audio_file
                .as_deref()
                .map(|path| super::media_url(base_url, path)),
            audio_status: processed.audio_status,
            created_at: processed.created_at.clone(),
            updated_at: processed.updated_at.clone(),
            source_excluded_pages: processed.source_excluded_pages.clone(),
        }
    }
}

/// `edited_text: null` (or a missing field) clears the override
#[derive(Debug, Deserialize)]
pub struct UpdateTextRequest {
    #[serde(default)]
    pub edited_text: Option<String>,
}

async fn respond(state: &AppState, principal: &Principal, processed: ProcessedDocument) -> Result<Json<ProcessedResponse>> {
    let document = state
        .processor()
        .get(principal, &processed.document_id)
        .await?;
    Ok(Json(ProcessedResponse::new(
        &processed,
        &document,
        &state.config().server.public_base_url,
    )))
}

async fn list_processed(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Vec<ProcessedResponse>>> {
    let base_url = &state.config().server.public_base_url;
    let mut items = Vec::new();
    for processed in state.processor().list_processed(&principal).await? {
        let document = state
            .processor()
            .get(&principal, &processed.document_id)
            .await?;
        items.push(ProcessedResponse::new(&processed, &document, base_url));
    }
    Ok(Json(items))
}

async fn get_processed(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<ProcessedResponse>> {
    let processed = state.processor().get_processed(&principal, &id).await?;
    respond(&state, &principal, processed).await
}

async fn update_text(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    body: std::result::Result<Json<UpdateTextRequest>, JsonRejection>,
) -> Result<Json<ProcessedResponse>> {
    let Json(body) = body?;
    let processed = state
        .processor()
        .update_text(&principal, &id, body.edited_text.as_deref())
        .await?;
    respond(&state, &principal, processed).await
}

async fn generate_audio(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<ProcessedResponse>> {
    let processed = state.processor().generate_audio(&principal, &id).await?;
    respond(&state, &principal, processed).await
}
