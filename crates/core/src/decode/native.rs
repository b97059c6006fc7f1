use crate::decode::{
    duration_from_samples, AudioDecoder, DecodeError, PcmChunk, PcmFormat, Result,
};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::{Path, PathBuf};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Pure-Rust decoder: keeps the native sample rate and averages channels
/// down to mono.
#[derive(Clone, Copy, Debug, Default)]
pub struct SymphoniaAudioDecoder;

impl SymphoniaAudioDecoder {
    pub fn new() -> Self {
        Self
    }

    pub fn decode_blocking(path: &Path) -> Result<PcmChunk> {
        let unsupported = |reason: String| DecodeError::Unsupported {
            path: path.to_path_buf(),
            reason,
        };

        let file = std::fs::File::open(path).map_err(|source| DecodeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| unsupported(e.to_string()))?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| unsupported("no audio track".to_owned()))?;
        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| unsupported("unknown sample rate".to_owned()))?;
        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| unsupported(e.to_string()))?;

        let mut samples = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break
                }
                Err(e) => return Err(unsupported(e.to_string())),
            };
            if packet.track_id() != track_id {
                continue;
            }
            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::DecodeError(msg)) => {
                    tracing::warn!(path = %path.display(), msg, "skipping corrupt packet");
                    continue;
                }
                Err(e) => return Err(unsupported(e.to_string())),
            };
            let spec = *decoded.spec();
            let channels = spec.channels.count().max(1);
            let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            buf.copy_interleaved_ref(decoded);
            samples.extend(
                buf.samples()
                    .chunks(channels)
                    .map(|frame| frame.iter().sum::<f32>() / channels as f32),
            );
        }

        Ok(PcmChunk {
            source: path.to_path_buf(),
            format: PcmFormat {
                sample_rate,
                channels: 1,
            },
            duration: duration_from_samples(sample_rate, samples.len()),
            samples,
        })
    }
}

impl AudioDecoder for SymphoniaAudioDecoder {
    fn decode_file(&self, path: PathBuf) -> BoxFuture<'_, Result<PcmChunk>> {
        async move {
            tokio::task::spawn_blocking(move || Self::decode_blocking(&path))
                .await
                .map_err(|e| DecodeError::Task(e.to_string()))?
        }
        .boxed()
    }
}
