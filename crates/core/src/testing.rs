//! Test doubles for the model traits and small fixture helpers.

use crate::asr::{AsrError, SpeechToTextModel};
use crate::emotion::{
    EmotionError, EmotionResult, KeywordTextEmotionModel, TextEmotionModel, VoiceEmotionModel,
};
use crate::text::{CorrectionError, TextCorrector};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::{Path, PathBuf};

/// Writes 16-bit mono PCM samples as a WAV file.
pub fn write_wav(path: &Path, sample_rate: u32, samples: &[i16]) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
    for &s in samples {
        writer.write_sample(s).expect("write sample");
    }
    writer.finalize().expect("finalize wav");
}

pub struct FailingCorrector;

impl TextCorrector for FailingCorrector {
    fn correct(&self, _text: String) -> BoxFuture<'_, Result<String, CorrectionError>> {
        async { Err(CorrectionError::InvalidResponse("corrector offline".to_owned())) }.boxed()
    }
}

/// Keyword emotion model that fails on texts containing a marker, in any case.
pub struct FailingTextEmotion {
    marker: &'static str,
}

impl FailingTextEmotion {
    pub fn on(marker: &'static str) -> Self {
        Self { marker }
    }
}

impl TextEmotionModel for FailingTextEmotion {
    fn predict(&self, text: String) -> BoxFuture<'_, Result<EmotionResult, EmotionError>> {
        async move {
            if text.to_lowercase().contains(&self.marker.to_lowercase()) {
                return Err(EmotionError::EmptyPrediction);
            }
            Ok(EmotionResult::from_label(KeywordTextEmotionModel::classify(&text)))
        }
        .boxed()
    }
}

/// Transcribes every file to `"<file stem> made me so happy"`, or fails for
/// stems starting with `broken`.
pub struct StemSpeechToText;

impl SpeechToTextModel for StemSpeechToText {
    fn transcribe(&self, audio_path: PathBuf) -> BoxFuture<'_, Result<String, AsrError>> {
        async move {
            let stem = audio_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_owned();
            if stem.starts_with("broken") {
                return Err(AsrError::Inference(format!("cannot transcribe {stem}")));
            }
            Ok(format!("{stem} made me so happy"))
        }
        .boxed()
    }
}

/// Always answers with one compact voice label.
pub struct FixedVoiceEmotion {
    label: &'static str,
    score: f32,
}

impl FixedVoiceEmotion {
    pub fn new(label: &'static str, score: f32) -> Self {
        Self { label, score }
    }
}

impl VoiceEmotionModel for FixedVoiceEmotion {
    fn predict(&self, _audio_path: PathBuf) -> BoxFuture<'_, Result<EmotionResult, EmotionError>> {
        async move { Ok(EmotionResult::from_voice_label(self.label, self.score)) }.boxed()
    }
}
