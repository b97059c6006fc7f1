//! Builds the model handles for each backend family.

use crate::asr::{AsrError, HfSpeechToText, SpeechToTextModel};
use crate::config::{Backend, Device, HfConfig, DEFAULT_WHISPER_MODEL};
use crate::decode::SymphoniaAudioDecoder;
use crate::emotion::{
    HfTextEmotionModel, HfVoiceEmotionModel, KeywordTextEmotionModel, ProsodyVoiceEmotionModel,
    TextEmotionModel,
};
use crate::hf::{HfError, HfInferenceClient};
use crate::text::{
    CorrectionError, LanguageToolCorrector, LexiconSentimentAnalyzer, RuleBasedCorrector,
    TextCorrector, TextModels, TokenStatementAnalyzer,
};
use crate::voice::VoiceModels;
use std::path::PathBuf;
use std::sync::Arc;

pub const LANGUAGETOOL_LANGUAGE: &str = "en-US";

#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("failed to create Hugging Face client: {0}")]
    Hf(#[from] HfError),
    #[error("failed to create LanguageTool client: {0}")]
    Correction(#[from] CorrectionError),
    #[error("failed to create speech-to-text model: {0}")]
    Asr(#[from] AsrError),
    #[error("local speech-to-text needs the whisper-rs feature; use the hf backend instead")]
    WhisperUnavailable,
}

#[derive(Clone, Debug)]
pub struct ModelSettings {
    pub backend: Backend,
    pub device: Device,
    pub hf: HfConfig,
    /// LanguageTool server; the offline corrector is used when unset.
    pub languagetool_url: Option<String>,
    pub whisper_model: PathBuf,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            device: Device::default(),
            hf: HfConfig::default(),
            languagetool_url: None,
            whisper_model: PathBuf::from(DEFAULT_WHISPER_MODEL),
        }
    }
}

impl ModelSettings {
    fn hf_client(&self) -> Result<HfInferenceClient, ModelError> {
        Ok(HfInferenceClient::new(&self.hf)?)
    }

    pub fn text_models(&self) -> Result<TextModels, ModelError> {
        let corrector: Arc<dyn TextCorrector> = match &self.languagetool_url {
            Some(url) => Arc::new(LanguageToolCorrector::new(url, LANGUAGETOOL_LANGUAGE)?),
            None => Arc::new(RuleBasedCorrector::new()),
        };
        let emotion: Arc<dyn TextEmotionModel> = match self.backend {
            Backend::Local => Arc::new(KeywordTextEmotionModel::new()),
            Backend::Hf => Arc::new(HfTextEmotionModel::new(self.hf_client()?)),
        };
        tracing::info!(
            backend = ?self.backend,
            languagetool = self.languagetool_url.is_some(),
            "text models ready"
        );
        Ok(TextModels {
            corrector,
            sentiment: Arc::new(LexiconSentimentAnalyzer::new()),
            emotion,
            statement: Arc::new(TokenStatementAnalyzer::new()),
        })
    }

    pub fn voice_models(&self) -> Result<VoiceModels, ModelError> {
        let models = match self.backend {
            Backend::Local => VoiceModels {
                speech_to_text: self.local_speech_to_text()?,
                voice_emotion: Arc::new(ProsodyVoiceEmotionModel::new(Arc::new(
                    SymphoniaAudioDecoder::new(),
                ))),
            },
            Backend::Hf => {
                let client = self.hf_client()?;
                VoiceModels {
                    speech_to_text: Arc::new(HfSpeechToText::new(client.clone())),
                    voice_emotion: Arc::new(HfVoiceEmotionModel::new(client)),
                }
            }
        };
        tracing::info!(backend = ?self.backend, device = %self.device, "voice models ready");
        Ok(models)
    }

    #[cfg(feature = "whisper-rs")]
    fn local_speech_to_text(&self) -> Result<Arc<dyn SpeechToTextModel>, ModelError> {
        let stt = crate::asr::WhisperSpeechToText::new(&self.whisper_model, self.device)?;
        Ok(Arc::new(stt))
    }

    #[cfg(not(feature = "whisper-rs"))]
    fn local_speech_to_text(&self) -> Result<Arc<dyn SpeechToTextModel>, ModelError> {
        Err(ModelError::WhisperUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::SentimentAnalyzer;

    #[test]
    fn local_text_models_build_offline() {
        let models = ModelSettings::default().text_models().expect("models");
        let sentiment = models
            .sentiment
            .analyze("a wonderful day", Default::default());
        assert_eq!(sentiment.polarity, 1.0);
    }

    #[test]
    fn languagetool_url_is_validated() {
        let settings = ModelSettings {
            languagetool_url: Some("not a url".to_owned()),
            ..ModelSettings::default()
        };
        assert!(matches!(
            settings.text_models(),
            Err(ModelError::Correction(CorrectionError::InvalidUrl(_)))
        ));
    }

    #[test]
    fn hf_backend_builds_without_network() {
        let settings = ModelSettings {
            backend: Backend::Hf,
            ..ModelSettings::default()
        };
        assert!(settings.text_models().is_ok());
        assert!(settings.voice_models().is_ok());
    }

    #[test]
    fn local_voice_models_need_a_whisper_model() {
        let settings = ModelSettings {
            whisper_model: PathBuf::from("/nonexistent/ggml.bin"),
            ..ModelSettings::default()
        };
        let err = settings.voice_models().err().expect("no model file");
        #[cfg(feature = "whisper-rs")]
        assert!(matches!(err, ModelError::Asr(AsrError::ModelNotFound(_))));
        #[cfg(not(feature = "whisper-rs"))]
        assert!(matches!(err, ModelError::WhisperUnavailable));
    }
}
