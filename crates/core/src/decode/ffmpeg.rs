use crate::decode::{
    duration_from_samples, parse_f32le_mono, AudioDecoder, DecodeError, PcmChunk, PcmFormat,
    Result,
};
use ffmpeg_sidecar::{download, paths::ffmpeg_path};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::{Path, PathBuf};

/// Decodes any container ffmpeg understands to 16 kHz mono f32, the input
/// format Whisper expects.
#[derive(Clone, Debug)]
pub struct FfmpegAudioDecoder {
    output_format: PcmFormat,
}

impl Default for FfmpegAudioDecoder {
    fn default() -> Self {
        Self {
            output_format: PcmFormat::whisper_mono_16khz(),
        }
    }
}

impl FfmpegAudioDecoder {
    fn ensure_ffmpeg_available() -> Result<()> {
        download::auto_download().map_err(|e| DecodeError::FfmpegUnavailable(e.to_string()))
    }

    async fn run_ffmpeg(&self, path: &Path) -> Result<Vec<f32>> {
        let sample_rate = self.output_format.sample_rate.to_string();
        let output = tokio::process::Command::new(ffmpeg_path())
            .args(["-hide_banner", "-nostdin", "-loglevel", "error", "-i"])
            .arg(path)
            .args([
                "-vn",
                "-sn",
                "-dn",
                "-ac",
                "1",
                "-ar",
                sample_rate.as_str(),
                "-f",
                "f32le",
                "-acodec",
                "pcm_f32le",
                "pipe:1",
            ])
            .stdin(std::process::Stdio::null())
            .output()
            .await
            .map_err(|e| DecodeError::FfmpegFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            return Err(DecodeError::FfmpegFailed(format!(
                "exit_code={:?} stderr={stderr}",
                output.status.code()
            )));
        }

        parse_f32le_mono(&output.stdout)
    }
}

impl AudioDecoder for FfmpegAudioDecoder {
    fn decode_file(&self, path: PathBuf) -> BoxFuture<'_, Result<PcmChunk>> {
        async move {
            tokio::task::spawn_blocking(Self::ensure_ffmpeg_available)
                .await
                .map_err(|e| DecodeError::Task(e.to_string()))??;
            let samples = self.run_ffmpeg(&path).await?;
            tracing::debug!(path = %path.display(), samples = samples.len(), "decoded with ffmpeg");
            Ok(PcmChunk {
                duration: duration_from_samples(self.output_format.sample_rate, samples.len()),
                source: path,
                format: self.output_format,
                samples,
            })
        }
        .boxed()
    }
}
