//! Processed document (derived text) database operations

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::document::{AudioStatus, ProcessedDocument};
use crate::error::{AppError, Result};

#[derive(Debug, sqlx::FromRow)]
struct ProcessedRow {
    id: String,
    document_id: String,
    extracted_text: String,
    source_excluded_pages: String,
    edited_text: Option<String>,
    audio_status: String,
    audio_file: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ProcessedRow> for ProcessedDocument {
    type Error = AppError;

    fn try_from(row: ProcessedRow) -> Result<Self> {
        Ok(ProcessedDocument {
            audio_status: row
                .audio_status
                .parse()
                .map_err(|e| super::corrupt("audio_status", e))?,
            source_excluded_pages: super::pages_from_json(&row.source_excluded_pages)?,
            id: row.id,
            document_id: row.document_id,
            extracted_text: row.extracted_text,
            edited_text: row.edited_text,
            audio_file: row.audio_file,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT p.id, p.document_id, p.extracted_text, p.source_excluded_pages, p.edited_text,
           p.audio_status, p.audio_file, p.created_at, p.updated_at
    FROM processed_documents p
"#;

/// Processed document repository
pub struct ProcessedRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProcessedRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, id: &str) -> Result<Option<ProcessedDocument>> {
        let row = sqlx::query_as::<_, ProcessedRow>(&format!("{} WHERE p.id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(ProcessedDocument::try_from).transpose()
    }

    pub async fn find_for_document(&self, document_id: &str) -> Result<Option<ProcessedDocument>> {
        let row = sqlx::query_as::<_, ProcessedRow>(&format!(
            "{} WHERE p.document_id = ?",
            SELECT_COLUMNS
        ))
        .bind(document_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(ProcessedDocument::try_from).transpose()
    }

    /// Fetch through the owning document; anything not owned is `NotFound`
    pub async fn get(&self, id: &str, owner_id: &str) -> Result<ProcessedDocument> {
        let row = sqlx::query_as::<_, ProcessedRow>(&format!(
            "{} JOIN documents d ON d.id = p.document_id WHERE p.id = ? AND d.owner_id = ?",
            SELECT_COLUMNS
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(ProcessedDocument::try_from)
            .transpose()?
            .ok_or_else(|| AppError::NotFound(format!("Processed document not found: {}", id)))
    }

    pub async fn list(&self, owner_id: &str) -> Result<Vec<ProcessedDocument>> {
        let rows = sqlx::query_as::<_, ProcessedRow>(&format!(
            "{} JOIN documents d ON d.id = p.document_id WHERE d.owner_id = ? ORDER BY p.created_at DESC",
            SELECT_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(ProcessedDocument::try_from).collect()
    }

    /// Create the derived text for a document, or overwrite its extracted text.
    ///
    /// The user's edit and the audio state survive re-extraction.
    pub async fn save_extraction(
        &self,
        document_id: &str,
        extracted_text: &str,
        source_excluded_pages: &[u32],
    ) -> Result<ProcessedDocument> {
        let now = super::now();

        sqlx::query(
            r#"
            INSERT INTO processed_documents
                (id, document_id, extracted_text, source_excluded_pages, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(document_id) DO UPDATE SET
                extracted_text = excluded.extracted_text,
                source_excluded_pages = excluded.source_excluded_pages,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(document_id)
        .bind(extracted_text)
        .bind(super::pages_to_json(source_excluded_pages)?)
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await?;

        self.find_for_document(document_id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to fetch saved extraction".to_string()))
    }

    /// Set or clear the user override
    pub async fn update_edited_text(
        &self,
        id: &str,
        owner_id: &str,
        edited_text: Option<&str>,
    ) -> Result<ProcessedDocument> {
        // Ownership check first so a foreign id is indistinguishable from a missing one
        self.get(id, owner_id).await?;

        sqlx::query("UPDATE processed_documents SET edited_text = ?, updated_at = ? WHERE id = ?")
            .bind(edited_text)
            .bind(super::now())
            .bind(id)
            .execute(self.pool)
            .await?;

        self.get(id, owner_id).await
    }

    pub async fn set_audio_status(
        &self,
        id: &str,
        status: AudioStatus,
        audio_file: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE processed_documents
            SET audio_status = ?, audio_file = COALESCE(?, audio_file), updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(audio_file)
        .bind(super::now())
        .bind(id)
        .execute(self.pool)
        .await?;
        Ok(())
    }
}
