#[cfg(feature = "ffmpeg-sidecar")]
mod ffmpeg;
mod native;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[cfg(feature = "ffmpeg-sidecar")]
pub use ffmpeg::FfmpegAudioDecoder;
pub use native::SymphoniaAudioDecoder;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmFormat {
    pub const fn whisper_mono_16khz() -> Self {
        Self {
            sample_rate: 16_000,
            channels: 1,
        }
    }
}

/// Decoded mono f32 samples of one audio file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PcmChunk {
    pub source: PathBuf,
    pub format: PcmFormat,
    pub samples: Vec<f32>,
    pub duration: Duration,
}

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("ffmpeg unavailable: {0}")]
    FfmpegUnavailable(String),

    #[error("ffmpeg failed: {0}")]
    FfmpegFailed(String),

    #[error("unsupported audio in {path}: {reason}")]
    Unsupported { path: PathBuf, reason: String },

    #[error("invalid pcm output: {0}")]
    InvalidPcm(String),

    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("decoder task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, DecodeError>;

pub trait AudioDecoder: Send + Sync {
    fn decode_file(&self, path: PathBuf) -> BoxFuture<'_, Result<PcmChunk>>;
}

pub fn duration_from_samples(sample_rate_hz: u32, samples: usize) -> Duration {
    if sample_rate_hz == 0 {
        return Duration::from_secs(0);
    }
    let micros = (u128::from(samples as u64) * 1_000_000u128) / u128::from(sample_rate_hz);
    Duration::from_micros(micros.min(u128::from(u64::MAX)) as u64)
}

#[cfg(any(feature = "ffmpeg-sidecar", test))]
pub(crate) fn parse_f32le_mono(raw: &[u8]) -> Result<Vec<f32>> {
    if raw.len() % 4 != 0 {
        return Err(DecodeError::InvalidPcm(format!(
            "f32le byte length must be multiple of 4, got {}",
            raw.len()
        )));
    }
    Ok(raw
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
