//! Document database operations
//!
//! The repository never checks page ranges: callers run
//! [`crate::document::validate_and_normalize`] before writing exclusions.

use sqlx::SqlitePool;

use crate::document::{Document, ProcessingStatus};
use crate::error::{AppError, Result};

#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: String,
    owner_id: String,
    filename: String,
    file_path: String,
    uploaded_at: String,
    total_pages: i64,
    excluded_pages: String,
    thumbnails_ready: bool,
    thumbnail_count: i64,
    status: String,
    version: i64,
}

impl TryFrom<DocumentRow> for Document {
    type Error = AppError;

    fn try_from(row: DocumentRow) -> Result<Self> {
        Ok(Document {
            status: row
                .status
                .parse()
                .map_err(|e| super::corrupt("status", e))?,
            excluded_pages: super::pages_from_json(&row.excluded_pages)?,
            id: row.id,
            owner_id: row.owner_id,
            filename: row.filename,
            file_path: row.file_path,
            uploaded_at: row.uploaded_at,
            total_pages: row.total_pages.max(0) as u32,
            thumbnails_ready: row.thumbnails_ready,
            thumbnail_count: row.thumbnail_count.max(0) as u32,
            version: row.version,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, owner_id, filename, file_path, uploaded_at, total_pages, excluded_pages,
           thumbnails_ready, thumbnail_count, status, version
    FROM documents
"#;

/// Create document request
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub id: String,
    pub owner_id: String,
    pub filename: String,
    pub file_path: String,
}

/// Document repository
pub struct DocumentRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> DocumentRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a freshly uploaded document (status `uploaded`, no pages yet)
    pub async fn create(&self, data: &NewDocument) -> Result<Document> {
        sqlx::query(
            r#"
            INSERT INTO documents (id, owner_id, filename, file_path, uploaded_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&data.id)
        .bind(&data.owner_id)
        .bind(&data.filename)
        .bind(&data.file_path)
        .bind(super::now())
        .execute(self.pool)
        .await?;

        self.find(&data.id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to fetch created document".to_string()))
    }

    /// Look up by id alone, for internal bookkeeping after ownership was checked
    pub async fn find(&self, id: &str) -> Result<Option<Document>> {
        let row = sqlx::query_as::<_, DocumentRow>(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(Document::try_from).transpose()
    }

    /// Fetch a document owned by `owner_id`; anything else is `NotFound`
    pub async fn get(&self, id: &str, owner_id: &str) -> Result<Document> {
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            "{} WHERE id = ? AND owner_id = ?",
            SELECT_COLUMNS
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Document::try_from)
            .transpose()?
            .ok_or_else(|| AppError::NotFound(format!("Document not found: {}", id)))
    }

    /// Documents owned by a user, newest first
    pub async fn list(&self, owner_id: &str) -> Result<Vec<Document>> {
        let rows = sqlx::query_as::<_, DocumentRow>(&format!(
            "{} WHERE owner_id = ? ORDER BY uploaded_at DESC, rowid DESC",
            SELECT_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Document::try_from).collect()
    }

    pub async fn update_page_count(&self, id: &str, total_pages: u32) -> Result<()> {
        sqlx::query("UPDATE documents SET total_pages = ? WHERE id = ?")
            .bind(i64::from(total_pages))
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_status(&self, id: &str, status: ProcessingStatus) -> Result<()> {
        sqlx::query("UPDATE documents SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Record that `count` page thumbnails were written
    pub async fn mark_thumbnails(&self, id: &str, count: u32) -> Result<()> {
        sqlx::query("UPDATE documents SET thumbnails_ready = 1, thumbnail_count = ? WHERE id = ?")
            .bind(i64::from(count))
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Replace the excluded set and bump the version.
    ///
    /// With `expected_version` the write only lands if nobody else changed the
    /// selection in between; without it the last writer wins.
    pub async fn set_excluded_pages(
        &self,
        id: &str,
        owner_id: &str,
        pages: &[u32],
        expected_version: Option<i64>,
    ) -> Result<Document> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET excluded_pages = ?, version = version + 1
            WHERE id = ? AND owner_id = ? AND (? IS NULL OR version = ?)
            "#,
        )
        .bind(super::pages_to_json(pages)?)
        .bind(id)
        .bind(owner_id)
        .bind(expected_version)
        .bind(expected_version)
        .execute(self.pool)
        .await?;

        let current = self.get(id, owner_id).await?;

        if result.rows_affected() == 0 {
            if let Some(expected) = expected_version {
                return Err(AppError::VersionConflict {
                    expected,
                    current: current.version,
                });
            }
        }

        Ok(current)
    }

    /// Delete a document (derived text goes with it); false if not owned/found
    pub async fn delete(&self, id: &str, owner_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
