//! Audio generation
//!
//! - `synth`: the [`SpeechSynthesizer`] seam and an `espeak-ng` implementation
//! - `dispatcher`: the background queue that runs synthesis after the request returns

mod dispatcher;
mod synth;

pub use dispatcher::{AudioCompletion, AudioDispatcher, AudioStatusRecorder, AudioTask};
pub use synth::{EspeakSynthesizer, SpeechSynthesizer};

use thiserror::Error;

/// Audio generation errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Speech synthesizer unavailable: {0}")]
    Unavailable(String),
    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),
    #[error("Audio queue is closed")]
    QueueClosed,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
