//! Application state management

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::audio::{AudioDispatcher, AudioStatusRecorder, EspeakSynthesizer};
use crate::config::{Config, SynthesizerKind};
use crate::pdf::{MuPdfBackend, PageRenderer, TextExtractor};
use crate::processing::DocumentProcessor;
use crate::storage::MediaStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    db: SqlitePool,
    media: MediaStore,
    processor: DocumentProcessor,
}

impl AppState {
    /// Create the production state: MuPDF collaborators and the configured synthesizer.
    ///
    /// Starts the audio worker, so this must run inside the Tokio runtime.
    pub fn new(config: Config, db: SqlitePool) -> Self {
        let mupdf = Arc::new(MuPdfBackend::new());
        let media = MediaStore::new(config.media.root.clone());

        let audio = match config.audio.synthesizer {
            SynthesizerKind::Espeak => {
                tracing::info!(voice = %config.audio.espeak_voice, "Audio synthesis via espeak-ng");
                AudioDispatcher::start(
                    Arc::new(EspeakSynthesizer::new(&config.audio.espeak_voice)),
                    Arc::new(AudioStatusRecorder::new(db.clone(), media)),
                )
            }
            SynthesizerKind::None => {
                tracing::info!("No speech synthesizer configured; audio requests stay queued");
                AudioDispatcher::deferred()
            }
        };

        Self::with_backends(config, db, mupdf.clone(), mupdf, audio)
    }

    /// Create state with explicit collaborators
    pub fn with_backends(
        config: Config,
        db: SqlitePool,
        renderer: Arc<dyn PageRenderer>,
        extractor: Arc<dyn TextExtractor>,
        audio: AudioDispatcher,
    ) -> Self {
        let media = MediaStore::new(config.media.root.clone());
        let processor = DocumentProcessor::new(
            db.clone(),
            media.clone(),
            renderer,
            extractor,
            audio,
            &config.processing,
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                media,
                processor,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the database pool
    pub fn db(&self) -> &SqlitePool {
        &self.inner.db
    }

    pub fn media(&self) -> &MediaStore {
        &self.inner.media
    }

    pub fn processor(&self) -> &DocumentProcessor {
        &self.inner.processor
    }
}
