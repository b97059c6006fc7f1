mod hf;
#[cfg(feature = "whisper-rs")]
mod whisper;

use crate::decode::DecodeError;
use crate::hf::HfError;
use futures::future::BoxFuture;
use std::path::PathBuf;

pub use hf::{HfSpeechToText, DEFAULT_ASR_MODEL};
#[cfg(feature = "whisper-rs")]
pub use whisper::WhisperSpeechToText;

#[derive(thiserror::Error, Debug)]
pub enum AsrError {
    #[error("speech model not found at {0}")]
    ModelNotFound(PathBuf),
    #[error("failed to load speech model: {0}")]
    ModelLoad(String),
    #[error("speech inference failed: {0}")]
    Inference(String),
    #[error("expected 16 kHz mono audio, got {sample_rate} Hz with {channels} channel(s)")]
    UnsupportedFormat { sample_rate: u32, channels: u16 },
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("remote transcription failed: {0}")]
    Remote(#[from] HfError),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub trait SpeechToTextModel: Send + Sync {
    fn transcribe(&self, audio_path: PathBuf) -> BoxFuture<'_, Result<String, AsrError>>;
}
