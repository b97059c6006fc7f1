use crate::decode::{AudioDecoder, PcmChunk};
use crate::emotion::{
    is_known_emotion, EmotionError, EmotionResult, LabelScore, VoiceEmotionModel,
};
use crate::hf::HfInferenceClient;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_VOICE_EMOTION_MODEL: &str = "superb/wav2vec2-base-superb-er";

const COMPACT_LABELS: &[(&str, &str)] = &[
    ("hap", "joy"),
    ("sad", "sadness"),
    ("ang", "anger"),
    ("neu", "neutral"),
];

/// Maps the compact voice vocabulary onto the shared emotion names.
///
/// Labels that already belong to the shared vocabulary pass through;
/// anything else becomes `neutral`.
pub fn remap_voice_label(raw: &str) -> &str {
    if let Some((_, full)) = COMPACT_LABELS.iter().find(|(short, _)| *short == raw) {
        return *full;
    }
    if is_known_emotion(raw) {
        raw
    } else {
        "neutral"
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProsodyFeatures {
    pub energy_rms: f32,
    pub pitch_hz: Option<f32>,
}

impl ProsodyFeatures {
    /// RMS energy plus a zero-crossing pitch estimate.
    pub fn from_pcm(pcm: &PcmChunk) -> Self {
        let samples = &pcm.samples;
        if samples.is_empty() {
            return Self {
                energy_rms: 0.0,
                pitch_hz: None,
            };
        }
        let energy_rms =
            (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt();
        let crossings = samples
            .windows(2)
            .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
            .count();
        let seconds = samples.len() as f32 / pcm.format.sample_rate.max(1) as f32;
        let pitch_hz = if energy_rms < SILENCE_RMS || seconds <= 0.0 {
            None
        } else {
            Some(crossings as f32 / (2.0 * seconds))
        };
        Self {
            energy_rms,
            pitch_hz,
        }
    }
}

const SILENCE_RMS: f32 = 0.005;
const QUIET_RMS: f32 = 0.02;
const LOUD_RMS: f32 = 0.1;

/// Compact-vocabulary label for a set of prosody features.
pub fn classify_prosody(features: &ProsodyFeatures) -> LabelScore {
    let energy = features.energy_rms;
    let (label, score) = match features.pitch_hz {
        _ if energy < QUIET_RMS => ("neu", 0.5),
        Some(pitch) if energy >= LOUD_RMS && pitch >= 200.0 => ("hap", 0.5 + energy.min(0.5)),
        Some(_) if energy >= LOUD_RMS => ("ang", 0.5 + energy.min(0.5)),
        Some(pitch) if pitch < 150.0 => ("sad", 0.55),
        _ => ("neu", 0.5),
    };
    LabelScore {
        label: label.to_owned(),
        score,
    }
}

/// Offline voice emotion rules over decoded audio energy and pitch.
#[derive(Clone)]
pub struct ProsodyVoiceEmotionModel {
    decoder: Arc<dyn AudioDecoder>,
}

impl ProsodyVoiceEmotionModel {
    pub fn new(decoder: Arc<dyn AudioDecoder>) -> Self {
        Self { decoder }
    }
}

impl VoiceEmotionModel for ProsodyVoiceEmotionModel {
    fn predict(&self, audio_path: PathBuf) -> BoxFuture<'_, Result<EmotionResult, EmotionError>> {
        async move {
            let pcm = self.decoder.decode_file(audio_path).await?;
            let features = ProsodyFeatures::from_pcm(&pcm);
            let top = classify_prosody(&features);
            tracing::debug!(
                path = %pcm.source.display(),
                energy = features.energy_rms,
                pitch = ?features.pitch_hz,
                label = %top.label,
                "prosody classified"
            );
            Ok(EmotionResult::from_voice_label(&top.label, top.score))
        }
        .boxed()
    }
}

/// Audio-classification model served by the Hugging Face Inference API.
#[derive(Clone)]
pub struct HfVoiceEmotionModel {
    client: HfInferenceClient,
    model: String,
}

impl HfVoiceEmotionModel {
    pub fn new(client: HfInferenceClient) -> Self {
        Self::with_model(client, DEFAULT_VOICE_EMOTION_MODEL)
    }

    pub fn with_model(client: HfInferenceClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

impl VoiceEmotionModel for HfVoiceEmotionModel {
    fn predict(&self, audio_path: PathBuf) -> BoxFuture<'_, Result<EmotionResult, EmotionError>> {
        async move {
            let audio = tokio::fs::read(&audio_path)
                .await
                .map_err(|source| EmotionError::Io {
                    path: audio_path.clone(),
                    source,
                })?;
            let labels = self.client.classify_audio(&self.model, audio.into()).await?;
            let top = labels.into_iter().next().ok_or(EmotionError::EmptyPrediction)?;
            Ok(EmotionResult::from_voice_label(&top.label, top.score))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{PcmFormat, SymphoniaAudioDecoder};
    use crate::emotion::{Arousal, Valence};
    use crate::testing::write_wav;
    use std::time::Duration;

    fn pcm(sample_rate: u32, samples: Vec<f32>) -> PcmChunk {
        PcmChunk {
            source: PathBuf::from("test.wav"),
            format: PcmFormat {
                sample_rate,
                channels: 1,
            },
            duration: Duration::from_secs(1),
            samples,
        }
    }

    fn square(freq: u32, sample_rate: u32, amplitude: f32) -> Vec<f32> {
        let period = (sample_rate / freq) as usize;
        (0..sample_rate as usize)
            .map(|i| if (i % period) < period / 2 { amplitude } else { -amplitude })
            .collect()
    }

    #[test]
    fn compact_labels_are_remapped() {
        assert_eq!(remap_voice_label("hap"), "joy");
        assert_eq!(remap_voice_label("neu"), "neutral");
        assert_eq!(remap_voice_label("ang"), "anger");
        assert_eq!(remap_voice_label("sad"), "sadness");
        assert_eq!(remap_voice_label("fear"), "fear");
        assert_eq!(remap_voice_label("xyz"), "neutral");
    }

    #[test]
    fn silence_has_no_pitch() {
        let f = ProsodyFeatures::from_pcm(&pcm(16_000, vec![0.0; 16_000]));
        assert_eq!(f.energy_rms, 0.0);
        assert!(f.pitch_hz.is_none());
        assert_eq!(classify_prosody(&f).label, "neu");
    }

    #[test]
    fn zero_crossing_pitch_estimate() {
        let f = ProsodyFeatures::from_pcm(&pcm(16_000, square(250, 16_000, 0.5)));
        let pitch = f.pitch_hz.expect("voiced");
        assert!((pitch - 250.0).abs() < 5.0, "pitch {pitch}");
        assert!((f.energy_rms - 0.5).abs() < 1e-3);
    }

    #[test]
    fn loud_high_pitch_is_happy_loud_low_pitch_is_angry() {
        let happy = classify_prosody(&ProsodyFeatures {
            energy_rms: 0.3,
            pitch_hz: Some(260.0),
        });
        assert_eq!(happy.label, "hap");
        assert!((happy.score - 0.8).abs() < 1e-6);

        let angry = classify_prosody(&ProsodyFeatures {
            energy_rms: 0.3,
            pitch_hz: Some(120.0),
        });
        assert_eq!(angry.label, "ang");

        let sad = classify_prosody(&ProsodyFeatures {
            energy_rms: 0.05,
            pitch_hz: Some(90.0),
        });
        assert_eq!(sad.label, "sad");
    }

    #[tokio::test]
    async fn prosody_model_reads_wav() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("loud.wav");
        let samples: Vec<i16> = square(250, 16_000, 0.5)
            .into_iter()
            .map(|s| (s * 32767.0) as i16)
            .collect();
        write_wav(&path, 16_000, &samples);

        let model = ProsodyVoiceEmotionModel::new(Arc::new(SymphoniaAudioDecoder::new()));
        let r = model.predict(path).await.expect("predict");
        assert_eq!(r.label, "joy");
        assert_eq!(r.valence, Valence::Positive);
        assert_eq!(r.arousal, Arousal::High);
        let score = r.score.expect("voice score");
        assert!((0.0..=1.0).contains(&score));
    }
}
