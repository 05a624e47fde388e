//! Document processing orchestrator
//!
//! Owns the upload → rendering → ready/error lifecycle, page selection,
//! text extraction and audio submission. Every operation takes the caller's
//! [`Principal`]; documents belonging to someone else are reported as missing.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;
use tokio::time::{timeout, Duration};
use uuid::Uuid;

use super::extract::extract_pages;
use crate::audio::{AudioDispatcher, AudioTask};
use crate::auth::Principal;
use crate::config::ProcessingConfig;
use crate::db::{DocumentRepository, NewDocument, ProcessedRepository};
use crate::document::{
    is_pdf, validate_and_normalize, AudioStatus, Document, ProcessedDocument, ProcessingStatus,
};
use crate::error::{AppError, Result};
use crate::pdf::{PageRenderer, PdfError, TextExtractor, ThumbnailOptions};
use crate::storage::{sanitize_filename, MediaStore};

#[derive(Clone)]
pub struct DocumentProcessor {
    pool: SqlitePool,
    media: MediaStore,
    renderer: Arc<dyn PageRenderer>,
    extractor: Arc<dyn TextExtractor>,
    audio: AudioDispatcher,
    thumbnails: ThumbnailOptions,
    timeout_secs: u64,
}

impl DocumentProcessor {
    pub fn new(
        pool: SqlitePool,
        media: MediaStore,
        renderer: Arc<dyn PageRenderer>,
        extractor: Arc<dyn TextExtractor>,
        audio: AudioDispatcher,
        config: &ProcessingConfig,
    ) -> Self {
        Self {
            pool,
            media,
            renderer,
            extractor,
            audio,
            thumbnails: ThumbnailOptions {
                max_pages: config.thumbnail_max_pages,
                dpi: config.thumbnail_dpi,
            },
            timeout_secs: config.timeout_secs,
        }
    }

    fn documents(&self) -> DocumentRepository<'_> {
        DocumentRepository::new(&self.pool)
    }

    fn processed(&self) -> ProcessedRepository<'_> {
        ProcessedRepository::new(&self.pool)
    }

    /// Run CPU-bound PDF work on the blocking pool, bounded by the configured timeout
    async fn blocking<T, F>(&self, work: F) -> std::result::Result<T, PdfError>
    where
        F: FnOnce() -> std::result::Result<T, PdfError> + Send + 'static,
        T: Send + 'static,
    {
        match timeout(
            Duration::from_secs(self.timeout_secs),
            tokio::task::spawn_blocking(work),
        )
        .await
        {
            Ok(joined) => {
                joined.map_err(|e| PdfError::MuPdf(format!("Task join error: {}", e)))?
            }
            Err(_) => Err(PdfError::Timeout(self.timeout_secs)),
        }
    }

    /// Store an uploaded PDF and render its thumbnails.
    ///
    /// Only invalid input is an error. Once the record exists a rendering
    /// failure is reported through `status = error` instead.
    pub async fn upload(&self, principal: &Principal, filename: &str, data: &[u8]) -> Result<Document> {
        let filename = sanitize_filename(filename)
            .ok_or_else(|| AppError::Validation("A file name is required".to_string()))?;
        if !filename.to_lowercase().ends_with(".pdf") {
            return Err(AppError::Validation("Only PDF files are supported".to_string()));
        }
        if data.is_empty() {
            return Err(AppError::Validation("The submitted file is empty".to_string()));
        }
        if !is_pdf(data) {
            return Err(AppError::Validation("The submitted file is not a valid PDF".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        let file_path = self.media.save_upload(&id, &filename, data).await?;

        let created = self
            .documents()
            .create(&NewDocument {
                id: id.clone(),
                owner_id: principal.user_id.clone(),
                filename,
                file_path,
            })
            .await;
        let document = match created {
            Ok(document) => document,
            Err(e) => {
                if let Err(cleanup) = self.media.remove_document(&id).await {
                    tracing::warn!(document_id = %id, "Failed to remove orphaned upload: {}", cleanup);
                }
                return Err(e);
            }
        };

        tracing::info!(
            document_id = %document.id,
            user_id = %principal.user_id,
            bytes = data.len(),
            "Document uploaded"
        );

        let status = self.render(&document).await?;
        tracing::info!(document_id = %document.id, status = %status, "Document processed");

        self.documents().get(&document.id, &principal.user_id).await
    }

    /// Count pages and write thumbnails; returns the terminal status
    async fn render(&self, document: &Document) -> Result<ProcessingStatus> {
        let repo = self.documents();
        repo.update_status(&document.id, ProcessingStatus::Rendering).await?;

        let path = self.media.absolute(&document.file_path);

        let renderer = Arc::clone(&self.renderer);
        let count_path = path.clone();
        let total_pages = match self.blocking(move || renderer.page_count(&count_path)).await {
            Ok(count) => count,
            Err(e) => {
                tracing::error!(document_id = %document.id, "Failed to count pages: {}", e);
                repo.update_status(&document.id, ProcessingStatus::Error).await?;
                return Ok(ProcessingStatus::Error);
            }
        };
        repo.update_page_count(&document.id, total_pages).await?;

        let renderer = Arc::clone(&self.renderer);
        let options = self.thumbnails;
        let images = match self
            .blocking(move || renderer.render_thumbnails(&path, &options))
            .await
        {
            Ok(images) => images,
            Err(e) => {
                tracing::error!(document_id = %document.id, "Failed to render thumbnails: {}", e);
                Vec::new()
            }
        };

        if images.is_empty() {
            tracing::warn!(document_id = %document.id, total_pages, "No thumbnails produced");
            repo.update_status(&document.id, ProcessingStatus::Error).await?;
            return Ok(ProcessingStatus::Error);
        }

        let written = match self.media.write_thumbnails(&document.id, &images).await {
            Ok(written) => written,
            Err(e) => {
                tracing::error!(document_id = %document.id, "Failed to store thumbnails: {}", e);
                repo.update_status(&document.id, ProcessingStatus::Error).await?;
                return Ok(ProcessingStatus::Error);
            }
        };

        repo.mark_thumbnails(&document.id, written).await?;
        repo.update_status(&document.id, ProcessingStatus::Ready).await?;
        tracing::debug!(document_id = %document.id, total_pages, thumbnails = written, "Thumbnails ready");

        Ok(ProcessingStatus::Ready)
    }

    pub async fn get(&self, principal: &Principal, id: &str) -> Result<Document> {
        self.documents().get(id, &principal.user_id).await
    }

    pub async fn list(&self, principal: &Principal) -> Result<Vec<Document>> {
        self.documents().list(&principal.user_id).await
    }

    /// Validate and store a new excluded-page set. Stored text is left alone.
    pub async fn update_page_selection(
        &self,
        principal: &Principal,
        id: &str,
        candidate_pages: &[i64],
        expected_version: Option<i64>,
    ) -> Result<Document> {
        let document = self.get(principal, id).await?;
        let pages = validate_and_normalize(candidate_pages, document.total_pages)?;

        let updated = self
            .documents()
            .set_excluded_pages(id, &principal.user_id, &pages, expected_version)
            .await?;

        tracing::info!(
            document_id = %id,
            excluded = ?updated.excluded_pages,
            version = updated.version,
            "Page selection updated"
        );
        Ok(updated)
    }

    /// Extract text from the document's current active pages
    pub async fn extract_text(&self, principal: &Principal, id: &str) -> Result<ProcessedDocument> {
        let document = self.get(principal, id).await?;
        if document.status != ProcessingStatus::Ready {
            return Err(AppError::NotReady(document.status));
        }

        let pages = document.active_pages();
        let path = self.media.absolute(&document.file_path);
        let extractor = Arc::clone(&self.extractor);
        let active = pages.clone();

        let text = self
            .blocking(move || extract_pages(extractor.as_ref(), &path, &active))
            .await
            .map_err(|e| {
                tracing::error!(document_id = %id, "Text extraction failed: {}", e);
                AppError::Processing(format!("Text extraction failed: {}", e))
            })?;

        let processed = self
            .processed()
            .save_extraction(&document.id, &text, &document.excluded_pages)
            .await?;

        tracing::info!(
            document_id = %id,
            processed_id = %processed.id,
            pages = pages.len(),
            chars = text.len(),
            "Text extracted"
        );
        Ok(processed)
    }

    pub async fn get_processed(&self, principal: &Principal, id: &str) -> Result<ProcessedDocument> {
        self.processed().get(id, &principal.user_id).await
    }

    pub async fn list_processed(&self, principal: &Principal) -> Result<Vec<ProcessedDocument>> {
        self.processed().list(&principal.user_id).await
    }

    /// Set the user's edit; `None` reverts to the extracted text
    pub async fn update_text(
        &self,
        principal: &Principal,
        id: &str,
        edited_text: Option<&str>,
    ) -> Result<ProcessedDocument> {
        let processed = self
            .processed()
            .update_edited_text(id, &principal.user_id, edited_text)
            .await?;

        tracing::debug!(processed_id = %id, cleared = edited_text.is_none(), "Edited text updated");
        Ok(processed)
    }

    /// Queue narration of the effective text; returns with `audio_status = processing`
    pub async fn generate_audio(&self, principal: &Principal, id: &str) -> Result<ProcessedDocument> {
        let processed = self.get_processed(principal, id).await?;
        let text = processed
            .text_for_audio()
            .ok_or_else(|| AppError::Validation("No text available for audio generation".to_string()))?
            .to_string();

        let relative = MediaStore::audio_path(&processed.document_id, Utc::now().timestamp_millis());
        let output = self.media.prepare(&relative).await?;

        self.processed()
            .set_audio_status(&processed.id, AudioStatus::Processing, None)
            .await?;
        // Read back before submitting; the worker may finish before we return
        let queued = self.get_processed(principal, id).await?;

        self.audio
            .submit(AudioTask {
                processed_id: processed.id.clone(),
                document_id: processed.document_id.clone(),
                text,
                output,
                relative_path: relative,
            })
            .map_err(|e| AppError::Processing(e.to_string()))?;

        tracing::info!(processed_id = %processed.id, "Audio generation queued");
        Ok(queued)
    }

    /// Delete a document, its derived text and every stored file
    pub async fn delete(&self, principal: &Principal, id: &str) -> Result<()> {
        let document = self.get(principal, id).await?;
        let audio_file = self
            .processed()
            .find_for_document(&document.id)
            .await?
            .and_then(|p| p.audio_file);

        if !self.documents().delete(id, &principal.user_id).await? {
            return Err(AppError::NotFound(format!("Document not found: {}", id)));
        }

        if let Err(e) = self.media.remove_document(id).await {
            tracing::warn!(document_id = %id, "Failed to remove document files: {}", e);
        }
        if let Some(audio) = audio_file {
            remove_quietly(&self.media.absolute(&audio)).await;
        }

        tracing::info!(document_id = %id, "Document deleted");
        Ok(())
    }
}

async fn remove_quietly(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), "Failed to remove file: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioError, AudioStatusRecorder, SpeechSynthesizer};
    use crate::config::Config;
    use crate::db::test_support;
    use crate::pdf::testing::ScriptedPdf;
    use async_trait::async_trait;
    use tempfile::TempDir;

    const PDF_BYTES: &[u8] = b"%PDF-1.4\n%fake\n";

    struct Fixture {
        pool: SqlitePool,
        media: MediaStore,
        principal: Principal,
        _db_dir: TempDir,
        _media_dir: TempDir,
    }

    impl Fixture {
        async fn new() -> Self {
            let (pool, db_dir) = test_support::pool().await;
            let user = test_support::user(&pool, "reader").await;
            let media_dir = tempfile::tempdir().unwrap();
            Self {
                media: MediaStore::new(media_dir.path()),
                principal: principal_for(&user),
                pool,
                _db_dir: db_dir,
                _media_dir: media_dir,
            }
        }

        fn processor(&self, pdf: ScriptedPdf) -> DocumentProcessor {
            self.processor_with_audio(pdf, AudioDispatcher::deferred())
        }

        fn processor_with_audio(&self, pdf: ScriptedPdf, audio: AudioDispatcher) -> DocumentProcessor {
            let pdf = Arc::new(pdf);
            DocumentProcessor::new(
                self.pool.clone(),
                self.media.clone(),
                pdf.clone(),
                pdf,
                audio,
                &Config::default().processing,
            )
        }
    }

    fn principal_for(user: &crate::db::User) -> Principal {
        Principal {
            user_id: user.id.clone(),
            username: user.username.clone(),
            token_hash: "test".to_string(),
        }
    }

    struct WritingSynth;

    #[async_trait]
    impl SpeechSynthesizer for WritingSynth {
        fn name(&self) -> &'static str {
            "writing"
        }

        async fn synthesize(&self, text: &str, output: &Path) -> std::result::Result<(), AudioError> {
            tokio::fs::write(output, text).await?;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_upload_renders_thumbnails() {
        let fx = Fixture::new().await;
        let processor = fx.processor(ScriptedPdf::with_pages(5));

        let doc = processor.upload(&fx.principal, "book.pdf", PDF_BYTES).await.unwrap();
        assert_eq!(doc.status, ProcessingStatus::Ready);
        assert!(doc.thumbnails_ready);
        assert_eq!(doc.total_pages, 5);
        assert_eq!(doc.thumbnail_count, 5);
        assert!(doc.excluded_pages.is_empty());
        assert_eq!(doc.file_path, format!("pdfs/{}/book.pdf", doc.id));
        assert!(fx.media.absolute(&doc.file_path).exists());
        assert!(fx
            .media
            .absolute(&MediaStore::thumbnail_path(&doc.id, 5))
            .exists());
    }

    #[tokio::test]
    async fn test_thumbnails_are_capped() {
        let fx = Fixture::new().await;
        let processor = fx.processor(ScriptedPdf::with_pages(30));

        let doc = processor.upload(&fx.principal, "long.pdf", PDF_BYTES).await.unwrap();
        assert_eq!(doc.total_pages, 30);
        assert_eq!(doc.thumbnail_count, 24);
        assert!(!fx
            .media
            .absolute(&MediaStore::thumbnail_path(&doc.id, 25))
            .exists());
    }

    #[tokio::test]
    async fn test_zero_thumbnails_is_an_error_status() {
        let fx = Fixture::new().await;
        let mut pdf = ScriptedPdf::with_pages(5);
        pdf.thumbnails = Some(0);
        let processor = fx.processor(pdf);

        let doc = processor.upload(&fx.principal, "a.pdf", PDF_BYTES).await.unwrap();
        assert_eq!(doc.status, ProcessingStatus::Error);
        assert!(!doc.thumbnails_ready);
        assert_eq!(doc.total_pages, 5);
    }

    #[tokio::test]
    async fn test_collaborator_failures_still_create_document() {
        let fx = Fixture::new().await;

        let mut no_count = ScriptedPdf::with_pages(3);
        no_count.page_count = None;
        let doc = fx
            .processor(no_count)
            .upload(&fx.principal, "a.pdf", PDF_BYTES)
            .await
            .unwrap();
        assert_eq!(doc.status, ProcessingStatus::Error);
        assert_eq!(doc.total_pages, 0);

        let mut no_render = ScriptedPdf::with_pages(3);
        no_render.thumbnails = None;
        let doc = fx
            .processor(no_render)
            .upload(&fx.principal, "b.pdf", PDF_BYTES)
            .await
            .unwrap();
        assert_eq!(doc.status, ProcessingStatus::Error);
        assert_eq!(doc.total_pages, 3);

        let processor = fx.processor(ScriptedPdf::with_pages(1));
        assert_eq!(processor.list(&fx.principal).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_non_pdf_uploads_are_rejected() {
        let fx = Fixture::new().await;
        let processor = fx.processor(ScriptedPdf::with_pages(1));

        let err = processor
            .upload(&fx.principal, "notes.txt", PDF_BYTES)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = processor
            .upload(&fx.principal, "fake.pdf", b"hello world")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = processor.upload(&fx.principal, "empty.pdf", b"").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        assert!(processor.list(&fx.principal).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_page_selection_updates_active_pages() {
        let fx = Fixture::new().await;
        let processor = fx.processor(ScriptedPdf::with_pages(5));
        let doc = processor.upload(&fx.principal, "a.pdf", PDF_BYTES).await.unwrap();

        let updated = processor
            .update_page_selection(&fx.principal, &doc.id, &[4, 2], None)
            .await
            .unwrap();
        assert_eq!(updated.excluded_pages, vec![2, 4]);
        assert_eq!(updated.active_pages(), vec![1, 3, 5]);
        assert_eq!(updated.active_pages_count(), 3);
        assert_eq!(updated.version, doc.version + 1);
    }

    #[tokio::test]
    async fn test_invalid_selection_leaves_stored_set() {
        let fx = Fixture::new().await;
        let processor = fx.processor(ScriptedPdf::with_pages(5));
        let doc = processor.upload(&fx.principal, "a.pdf", PDF_BYTES).await.unwrap();
        processor
            .update_page_selection(&fx.principal, &doc.id, &[1], None)
            .await
            .unwrap();

        let err = processor
            .update_page_selection(&fx.principal, &doc.id, &[3, 3, 7], None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidPageRange(ref e) if e.page == 7));

        let err = processor
            .update_page_selection(&fx.principal, &doc.id, &[0], None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidPageRange(_)));

        let stored = processor.get(&fx.principal, &doc.id).await.unwrap();
        assert_eq!(stored.excluded_pages, vec![1]);
    }

    #[tokio::test]
    async fn test_stale_version_is_a_conflict() {
        let fx = Fixture::new().await;
        let processor = fx.processor(ScriptedPdf::with_pages(5));
        let doc = processor.upload(&fx.principal, "a.pdf", PDF_BYTES).await.unwrap();

        processor
            .update_page_selection(&fx.principal, &doc.id, &[1], Some(doc.version))
            .await
            .unwrap();
        let err = processor
            .update_page_selection(&fx.principal, &doc.id, &[2], Some(doc.version))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::VersionConflict { .. }));
    }

    #[tokio::test]
    async fn test_documents_are_private_to_their_owner() {
        let fx = Fixture::new().await;
        let processor = fx.processor(ScriptedPdf::with_pages(2));
        let doc = processor.upload(&fx.principal, "a.pdf", PDF_BYTES).await.unwrap();

        let other = principal_for(&test_support::user(&fx.pool, "other").await);
        assert!(matches!(
            processor.get(&other, &doc.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            processor.update_page_selection(&other, &doc.id, &[1], None).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            processor.extract_text(&other, &doc.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(processor.list(&other).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_extraction_requires_ready_document() {
        let fx = Fixture::new().await;
        let mut pdf = ScriptedPdf::with_pages(3);
        pdf.thumbnails = Some(0);
        let processor = fx.processor(pdf);
        let doc = processor.upload(&fx.principal, "a.pdf", PDF_BYTES).await.unwrap();

        let err = processor.extract_text(&fx.principal, &doc.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotReady(ProcessingStatus::Error)));
    }

    #[tokio::test]
    async fn test_extraction_uses_active_pages_and_is_repeatable() {
        let fx = Fixture::new().await;
        let processor = fx.processor(ScriptedPdf::with_pages(5));
        let doc = processor.upload(&fx.principal, "a.pdf", PDF_BYTES).await.unwrap();
        processor
            .update_page_selection(&fx.principal, &doc.id, &[2, 4], None)
            .await
            .unwrap();

        let first = processor.extract_text(&fx.principal, &doc.id).await.unwrap();
        assert!(first.extracted_text.starts_with("--- Page 1 ---\nText of page 1"));
        assert!(first.extracted_text.contains("Text of page 3"));
        assert!(first.extracted_text.contains("Text of page 5"));
        assert!(!first.extracted_text.contains("Text of page 2"));
        assert_eq!(first.source_excluded_pages, vec![2, 4]);

        let second = processor.extract_text(&fx.principal, &doc.id).await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.extracted_text, first.extracted_text);
    }

    #[tokio::test]
    async fn test_selection_change_keeps_stored_text() {
        let fx = Fixture::new().await;
        let processor = fx.processor(ScriptedPdf::with_pages(3));
        let doc = processor.upload(&fx.principal, "a.pdf", PDF_BYTES).await.unwrap();
        let extracted = processor.extract_text(&fx.principal, &doc.id).await.unwrap();

        processor
            .update_page_selection(&fx.principal, &doc.id, &[1, 2], None)
            .await
            .unwrap();

        let stored = processor.get_processed(&fx.principal, &extracted.id).await.unwrap();
        assert_eq!(stored.extracted_text, extracted.extracted_text);
        assert!(stored.source_excluded_pages.is_empty());
    }

    #[tokio::test]
    async fn test_failing_page_is_skipped() {
        let fx = Fixture::new().await;
        let mut pdf = ScriptedPdf::with_pages(4);
        pdf.failing_pages.insert(2);
        let processor = fx.processor(pdf);
        let doc = processor.upload(&fx.principal, "a.pdf", PDF_BYTES).await.unwrap();

        let processed = processor.extract_text(&fx.principal, &doc.id).await.unwrap();
        assert!(processed.extracted_text.contains("Text of page 1"));
        assert!(processed.extracted_text.contains("Text of page 3"));
        assert!(processed.extracted_text.contains("Text of page 4"));
        assert!(!processed.extracted_text.contains("Text of page 2"));
    }

    #[tokio::test]
    async fn test_unreadable_file_keeps_prior_text() {
        let fx = Fixture::new().await;
        let healthy = fx.processor(ScriptedPdf::with_pages(2));
        let doc = healthy.upload(&fx.principal, "a.pdf", PDF_BYTES).await.unwrap();
        let before = healthy.extract_text(&fx.principal, &doc.id).await.unwrap();

        let mut broken = ScriptedPdf::with_pages(2);
        broken.unreadable = true;
        let err = fx
            .processor(broken)
            .extract_text(&fx.principal, &doc.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Processing(_)));

        let after = healthy.get_processed(&fx.principal, &before.id).await.unwrap();
        assert_eq!(after.extracted_text, before.extracted_text);
    }

    #[tokio::test]
    async fn test_edit_survives_re_extraction_and_can_be_cleared() {
        let fx = Fixture::new().await;
        let processor = fx.processor(ScriptedPdf::with_pages(2));
        let doc = processor.upload(&fx.principal, "a.pdf", PDF_BYTES).await.unwrap();
        let processed = processor.extract_text(&fx.principal, &doc.id).await.unwrap();

        let edited = processor
            .update_text(&fx.principal, &processed.id, Some("My version"))
            .await
            .unwrap();
        assert_eq!(edited.text_for_audio(), Some("My version"));

        let re_extracted = processor.extract_text(&fx.principal, &doc.id).await.unwrap();
        assert_eq!(re_extracted.edited_text.as_deref(), Some("My version"));

        let cleared = processor
            .update_text(&fx.principal, &processed.id, None)
            .await
            .unwrap();
        assert_eq!(cleared.edited_text, None);
        assert_eq!(cleared.text_for_audio(), Some(cleared.extracted_text.as_str()));
    }

    #[tokio::test]
    async fn test_generate_audio_needs_text() {
        let fx = Fixture::new().await;
        let mut pdf = ScriptedPdf::with_pages(2);
        pdf.blank_pages.extend([1, 2]);
        let processor = fx.processor(pdf);
        let doc = processor.upload(&fx.principal, "a.pdf", PDF_BYTES).await.unwrap();
        let processed = processor.extract_text(&fx.principal, &doc.id).await.unwrap();
        assert_eq!(processed.extracted_text, "");

        let err = processor
            .generate_audio(&fx.principal, &processed.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // An edit is enough on its own
        processor
            .update_text(&fx.principal, &processed.id, Some("Read this"))
            .await
            .unwrap();
        let queued = processor
            .generate_audio(&fx.principal, &processed.id)
            .await
            .unwrap();
        assert_eq!(queued.audio_status, AudioStatus::Processing);
        assert_eq!(queued.audio_file, None);
    }

    #[tokio::test]
    async fn test_generate_audio_completes_with_synthesizer() {
        let fx = Fixture::new().await;
        let audio = AudioDispatcher::start(
            Arc::new(WritingSynth),
            Arc::new(AudioStatusRecorder::new(fx.pool.clone(), fx.media.clone())),
        );
        let processor = fx.processor_with_audio(ScriptedPdf::with_pages(2), audio);
        let doc = processor.upload(&fx.principal, "a.pdf", PDF_BYTES).await.unwrap();
        let processed = processor.extract_text(&fx.principal, &doc.id).await.unwrap();

        processor
            .generate_audio(&fx.principal, &processed.id)
            .await
            .unwrap();

        let mut done = None;
        for _ in 0..100 {
            let current = processor
                .get_processed(&fx.principal, &processed.id)
                .await
                .unwrap();
            if current.audio_status == AudioStatus::Completed {
                done = Some(current);
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        let done = done.expect("audio never completed");
        let audio_file = done.audio_file.unwrap();
        assert!(audio_file.starts_with(&format!("audio/audio_{}_", doc.id)));
        assert_eq!(
            std::fs::read_to_string(fx.media.absolute(&audio_file)).unwrap(),
            processed.extracted_text
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_generate_audio_reports_queued_state_even_when_worker_is_fast() {
        let fx = Fixture::new().await;
        let audio = AudioDispatcher::start(
            Arc::new(WritingSynth),
            Arc::new(AudioStatusRecorder::new(fx.pool.clone(), fx.media.clone())),
        );
        let processor = fx.processor_with_audio(ScriptedPdf::with_pages(1), audio);
        let doc = processor.upload(&fx.principal, "a.pdf", PDF_BYTES).await.unwrap();
        let processed = processor.extract_text(&fx.principal, &doc.id).await.unwrap();

        for _ in 0..50 {
            let queued = processor
                .generate_audio(&fx.principal, &processed.id)
                .await
                .unwrap();
            assert_eq!(queued.audio_status, AudioStatus::Processing);
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    }

    #[tokio::test]
    async fn test_regenerating_audio_keeps_one_file() {
        let fx = Fixture::new().await;
        let audio = AudioDispatcher::start(
            Arc::new(WritingSynth),
            Arc::new(AudioStatusRecorder::new(fx.pool.clone(), fx.media.clone())),
        );
        let processor = fx.processor_with_audio(ScriptedPdf::with_pages(1), audio);
        let doc = processor.upload(&fx.principal, "a.pdf", PDF_BYTES).await.unwrap();
        let processed = processor.extract_text(&fx.principal, &doc.id).await.unwrap();

        let mut files = Vec::new();
        for _ in 0..2 {
            processor
                .generate_audio(&fx.principal, &processed.id)
                .await
                .unwrap();
            let mut stored = None;
            for _ in 0..100 {
                let current = processor
                    .get_processed(&fx.principal, &processed.id)
                    .await
                    .unwrap();
                if current.audio_status == AudioStatus::Completed
                    && current.audio_file.is_some()
                    && current.audio_file != files.last().cloned()
                {
                    stored = current.audio_file;
                    break;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            files.push(stored.expect("audio never completed"));
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        assert_ne!(files[0], files[1]);
        assert!(!fx.media.absolute(&files[0]).exists());
        assert!(fx.media.absolute(&files[1]).exists());
        let remaining = std::fs::read_dir(fx.media.absolute("audio")).unwrap().count();
        assert_eq!(remaining, 1);
    }

    #[tokio::test]
    async fn test_delete_removes_rows_and_files() {
        let fx = Fixture::new().await;
        let processor = fx.processor(ScriptedPdf::with_pages(2));
        let doc = processor.upload(&fx.principal, "a.pdf", PDF_BYTES).await.unwrap();
        let processed = processor.extract_text(&fx.principal, &doc.id).await.unwrap();

        processor.delete(&fx.principal, &doc.id).await.unwrap();

        assert!(!fx.media.absolute(&doc.file_path).exists());
        assert!(!fx
            .media
            .absolute(&MediaStore::thumbnail_path(&doc.id, 1))
            .exists());
        assert!(matches!(
            processor.get_processed(&fx.principal, &processed.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            processor.delete(&fx.principal, &doc.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
