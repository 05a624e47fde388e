//! Speech synthesizers

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use super::AudioError;

/// Text-to-speech backend
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Render `text` to an audio file at `output`
    async fn synthesize(&self, text: &str, output: &Path) -> Result<(), AudioError>;
}

/// `espeak-ng` subprocess synthesizer, writes WAV
pub struct EspeakSynthesizer {
    program: String,
    voice: String,
}

impl EspeakSynthesizer {
    pub fn new(voice: &str) -> Self {
        Self {
            program: "espeak-ng".to_string(),
            voice: voice.to_string(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for EspeakSynthesizer {
    fn name(&self) -> &'static str {
        "espeak-ng"
    }

    async fn synthesize(&self, text: &str, output: &Path) -> Result<(), AudioError> {
        let mut child = tokio::process::Command::new(&self.program)
            .arg("-v")
            .arg(&self.voice)
            .arg("-w")
            .arg(output)
            .arg("--stdin")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AudioError::Unavailable(format!("{}: {}", self.program, e)))?;

        // Text goes through stdin; dropping the handle closes it
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
        }

        let result = child.wait_with_output().await?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(AudioError::Synthesis(format!(
                "{} exited with {}: {}",
                self.program,
                result.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let synth = EspeakSynthesizer {
            program: "definitely-not-a-speech-binary".to_string(),
            voice: "en".to_string(),
        };
        let dir = tempfile::tempdir().unwrap();

        let err = synth
            .synthesize("hello", &dir.path().join("out.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, AudioError::Unavailable(_)));
    }
}
