use crate::asr::{AsrError, SpeechToTextModel};
use crate::hf::HfInferenceClient;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::PathBuf;

pub const DEFAULT_ASR_MODEL: &str = "openai/whisper-base";

/// Automatic-speech-recognition model served by the Hugging Face Inference API.
#[derive(Clone)]
pub struct HfSpeechToText {
    client: HfInferenceClient,
    model: String,
}

impl HfSpeechToText {
    pub fn new(client: HfInferenceClient) -> Self {
        Self::with_model(client, DEFAULT_ASR_MODEL)
    }

    pub fn with_model(client: HfInferenceClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

impl SpeechToTextModel for HfSpeechToText {
    fn transcribe(&self, audio_path: PathBuf) -> BoxFuture<'_, Result<String, AsrError>> {
        async move {
            let audio = tokio::fs::read(&audio_path)
                .await
                .map_err(|source| AsrError::Io {
                    path: audio_path.clone(),
                    source,
                })?;
            let text = self.client.transcribe(&self.model, audio.into()).await?;
            tracing::debug!(
                path = %audio_path.display(),
                chars = text.len(),
                "remote transcription done"
            );
            Ok(text.trim().to_owned())
        }
        .boxed()
    }
}
