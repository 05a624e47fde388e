//! Deferred audio work
//!
//! `generate_audio` never waits for synthesis. It hands an [`AudioTask`] to the
//! [`AudioDispatcher`]; a single background worker runs tasks in submission
//! order and reports each outcome through [`AudioCompletion`].

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;
use tokio::sync::mpsc;

use super::synth::SpeechSynthesizer;
use super::AudioError;
use crate::db::ProcessedRepository;
use crate::document::AudioStatus;
use crate::storage::MediaStore;

/// One narration job
#[derive(Debug, Clone)]
pub struct AudioTask {
    pub processed_id: String,
    pub document_id: String,
    pub text: String,
    /// Where the synthesizer writes
    pub output: PathBuf,
    /// `output` relative to the media root, as stored
    pub relative_path: String,
}

/// Completion callback for audio tasks
#[async_trait]
pub trait AudioCompletion: Send + Sync {
    async fn completed(&self, task: &AudioTask, outcome: Result<(), AudioError>);
}

/// Queue in front of the speech synthesizer
#[derive(Clone)]
pub struct AudioDispatcher {
    sender: Option<mpsc::UnboundedSender<AudioTask>>,
}

impl AudioDispatcher {
    /// Accepts tasks without running them; status stays `processing`
    pub fn deferred() -> Self {
        Self { sender: None }
    }

    /// Spawn the worker. Must be called inside a Tokio runtime.
    pub fn start(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        completion: Arc<dyn AudioCompletion>,
    ) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<AudioTask>();

        tokio::spawn(async move {
            while let Some(task) = receiver.recv().await {
                tracing::info!(
                    processed_id = %task.processed_id,
                    synthesizer = synthesizer.name(),
                    chars = task.text.len(),
                    "Synthesizing audio"
                );

                let outcome = synthesizer.synthesize(&task.text, &task.output).await;
                if let Err(e) = &outcome {
                    tracing::warn!(processed_id = %task.processed_id, "Audio synthesis failed: {}", e);
                }
                completion.completed(&task, outcome).await;
            }
            tracing::debug!("Audio worker stopped");
        });

        Self {
            sender: Some(sender),
        }
    }

    /// Whether submitted tasks will actually be synthesized
    pub fn is_active(&self) -> bool {
        self.sender.is_some()
    }

    pub fn submit(&self, task: AudioTask) -> Result<(), AudioError> {
        match &self.sender {
            Some(sender) => sender.send(task).map_err(|_| AudioError::QueueClosed),
            None => {
                tracing::info!(
                    processed_id = %task.processed_id,
                    "No speech synthesizer configured, audio task left in processing"
                );
                Ok(())
            }
        }
    }
}

/// Records task outcomes on the processed document.
///
/// A processed document keeps one narration: when a new file lands the
/// previous one is removed.
pub struct AudioStatusRecorder {
    pool: SqlitePool,
    media: MediaStore,
}

impl AudioStatusRecorder {
    pub fn new(pool: SqlitePool, media: MediaStore) -> Self {
        Self { pool, media }
    }

    async fn record(&self, task: &AudioTask, outcome: Result<(), AudioError>) -> crate::error::Result<()> {
        let repo = ProcessedRepository::new(&self.pool);

        if outcome.is_err() {
            return repo
                .set_audio_status(&task.processed_id, AudioStatus::Failed, None)
                .await;
        }

        let previous = repo
            .find(&task.processed_id)
            .await?
            .and_then(|p| p.audio_file)
            .filter(|old| *old != task.relative_path);

        repo.set_audio_status(
            &task.processed_id,
            AudioStatus::Completed,
            Some(&task.relative_path),
        )
        .await?;

        if let Some(old) = previous {
            match tokio::fs::remove_file(self.media.absolute(&old)).await {
                Ok(()) => tracing::debug!(processed_id = %task.processed_id, old = %old, "Replaced narration"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(path = %old, "Failed to remove previous narration: {}", e),
            }
        }

        Ok(())
    }
}

#[async_trait]
impl AudioCompletion for AudioStatusRecorder {
    async fn completed(&self, task: &AudioTask, outcome: Result<(), AudioError>) {
        if let Err(e) = self.record(task, outcome).await {
            tracing::error!(processed_id = %task.processed_id, "Failed to record audio outcome: {}", e);
        }
    }
}
