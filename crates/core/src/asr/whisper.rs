use crate::asr::{AsrError, SpeechToTextModel};
use crate::config::Device;
use crate::decode::{AudioDecoder, FfmpegAudioDecoder, PcmFormat};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, Once};
use whisper_rs::{
    install_logging_hooks, FullParams, SamplingStrategy, WhisperContext,
    WhisperContextParameters,
};

static LOGGING_HOOKS: Once = Once::new();

/// Local whisper.cpp transcription. Audio goes through ffmpeg to 16 kHz mono
/// first; the model is loaded once and shared across calls.
#[derive(Clone)]
pub struct WhisperSpeechToText {
    context: Arc<Mutex<WhisperContext>>,
    decoder: Arc<dyn AudioDecoder>,
    language: Option<String>,
    model_path: PathBuf,
}

impl std::fmt::Debug for WhisperSpeechToText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperSpeechToText")
            .field("model_path", &self.model_path)
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

impl WhisperSpeechToText {
    pub fn new(model_path: impl Into<PathBuf>, device: Device) -> Result<Self, AsrError> {
        LOGGING_HOOKS.call_once(install_logging_hooks);

        let model_path = model_path.into();
        if !model_path.exists() {
            return Err(AsrError::ModelNotFound(model_path));
        }
        let path_str = model_path
            .to_str()
            .ok_or_else(|| AsrError::ModelLoad("model path is not valid UTF-8".to_owned()))?;

        let mut context_params = WhisperContextParameters::default();
        context_params.use_gpu(device.is_accelerated());
        let context = WhisperContext::new_with_params(path_str, context_params)
            .map_err(|e| AsrError::ModelLoad(e.to_string()))?;
        tracing::info!(model = %model_path.display(), device = %device, "whisper model loaded");

        Ok(Self {
            context: Arc::new(Mutex::new(context)),
            decoder: Arc::new(FfmpegAudioDecoder::default()),
            language: Some("en".to_owned()),
            model_path,
        })
    }

    fn run(
        context: &Mutex<WhisperContext>,
        samples: &[f32],
        language: Option<&str>,
    ) -> Result<String, AsrError> {
        let context = context
            .lock()
            .map_err(|e| AsrError::Inference(format!("whisper context lock poisoned: {e}")))?;
        let mut state = context
            .create_state()
            .map_err(|e| AsrError::Inference(format!("failed to create state: {e}")))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(language);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, samples)
            .map_err(|e| AsrError::Inference(e.to_string()))?;

        let mut text = String::new();
        for segment in state.as_iter() {
            text.push_str(&segment.to_string());
        }
        Ok(text.trim().to_owned())
    }
}

impl SpeechToTextModel for WhisperSpeechToText {
    fn transcribe(&self, audio_path: PathBuf) -> BoxFuture<'_, Result<String, AsrError>> {
        async move {
            let pcm = self.decoder.decode_file(audio_path).await?;
            let expected = PcmFormat::whisper_mono_16khz();
            if pcm.format != expected {
                return Err(AsrError::UnsupportedFormat {
                    sample_rate: pcm.format.sample_rate,
                    channels: pcm.format.channels,
                });
            }

            let context = Arc::clone(&self.context);
            let language = self.language.clone();
            let samples = pcm.samples;
            let text = tokio::task::spawn_blocking(move || {
                Self::run(&context, &samples, language.as_deref())
            })
            .await
            .map_err(|e| AsrError::Inference(format!("whisper task failed: {e}")))??;

            tracing::debug!(
                path = %pcm.source.display(),
                seconds = pcm.duration.as_secs_f32(),
                chars = text.len(),
                "whisper transcription done"
            );
            Ok(text)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_is_reported() {
        let err = WhisperSpeechToText::new("/nonexistent/ggml-base.bin", Device::Cpu)
            .expect_err("missing model");
        assert!(matches!(err, AsrError::ModelNotFound(_)));
    }
}
