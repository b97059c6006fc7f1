mod text;
mod voice;

use crate::decode::DecodeError;
use crate::hf::HfError;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use text::{HfTextEmotionModel, KeywordTextEmotionModel, DEFAULT_TEXT_EMOTION_MODEL};
pub use voice::{
    classify_prosody, remap_voice_label, HfVoiceEmotionModel, ProsodyFeatures,
    ProsodyVoiceEmotionModel, DEFAULT_VOICE_EMOTION_MODEL,
};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Valence {
    Positive,
    Negative,
    Neutral,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Arousal {
    High,
    Low,
    Neutral,
}

impl Valence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Valence::Positive => "positive",
            Valence::Negative => "negative",
            Valence::Neutral => "neutral",
        }
    }
}

impl Arousal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Arousal::High => "high",
            Arousal::Low => "low",
            Arousal::Neutral => "neutral",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dimensions {
    pub valence: Valence,
    pub arousal: Arousal,
}

const NEUTRAL_DIMENSIONS: Dimensions = Dimensions {
    valence: Valence::Neutral,
    arousal: Arousal::Neutral,
};

const DIMENSION_TABLE: &[(&str, Dimensions)] = &[
    (
        "joy",
        Dimensions {
            valence: Valence::Positive,
            arousal: Arousal::High,
        },
    ),
    (
        "surprise",
        Dimensions {
            valence: Valence::Positive,
            arousal: Arousal::High,
        },
    ),
    (
        "anger",
        Dimensions {
            valence: Valence::Negative,
            arousal: Arousal::High,
        },
    ),
    (
        "fear",
        Dimensions {
            valence: Valence::Negative,
            arousal: Arousal::High,
        },
    ),
    (
        "disgust",
        Dimensions {
            valence: Valence::Negative,
            arousal: Arousal::Low,
        },
    ),
    (
        "sadness",
        Dimensions {
            valence: Valence::Negative,
            arousal: Arousal::Low,
        },
    ),
    ("neutral", NEUTRAL_DIMENSIONS),
];

/// Valence/arousal pair for an emotion label; unknown labels are neutral.
pub fn map_emotion_to_dimensions(label: &str) -> Dimensions {
    DIMENSION_TABLE
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, dims)| *dims)
        .unwrap_or(NEUTRAL_DIMENSIONS)
}

pub fn is_known_emotion(label: &str) -> bool {
    DIMENSION_TABLE.iter().any(|(name, _)| *name == label)
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EmotionResult {
    pub label: String,
    pub valence: Valence,
    pub arousal: Arousal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl EmotionResult {
    pub fn from_label<S: Into<String>>(label: S) -> Self {
        let label = label.into();
        let dims = map_emotion_to_dimensions(&label);
        Self {
            label,
            valence: dims.valence,
            arousal: dims.arousal,
            score: None,
        }
    }

    /// Builds a result from a raw voice classifier label, remapping the
    /// compact vocabulary first.
    pub fn from_voice_label(raw_label: &str, score: f32) -> Self {
        Self {
            score: Some(score.clamp(0.0, 1.0)),
            ..Self::from_label(remap_voice_label(raw_label))
        }
    }
}

/// One classifier output, sorted best-first by the backends.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LabelScore {
    pub label: String,
    pub score: f32,
}

#[derive(thiserror::Error, Debug)]
pub enum EmotionError {
    #[error("classifier returned no prediction")]
    EmptyPrediction,
    #[error("inference request failed: {0}")]
    Inference(#[from] HfError),
    #[error("audio decoding failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub trait TextEmotionModel: Send + Sync {
    fn predict(&self, text: String) -> BoxFuture<'_, Result<EmotionResult, EmotionError>>;
}

pub trait VoiceEmotionModel: Send + Sync {
    fn predict(&self, audio_path: PathBuf) -> BoxFuture<'_, Result<EmotionResult, EmotionError>>;
}
