use crate::emotion::{EmotionError, EmotionResult, TextEmotionModel};
use crate::hf::HfInferenceClient;
use futures::future::BoxFuture;
use futures::FutureExt;

pub const DEFAULT_TEXT_EMOTION_MODEL: &str = "j-hartmann/emotion-english-distilroberta-base";

// Classifier input limit, in characters.
const HF_MAX_INPUT_CHARS: usize = 512;

// Declaration order breaks ties.
const KEYWORDS: &[(&str, &[&str])] = &[
    (
        "joy",
        &[
            "happy", "happiness", "joy", "joyful", "glad", "delighted", "excited", "love",
            "loved", "great", "wonderful", "awesome", "fantastic", "pleased", "cheerful",
            "yay", "thrilled", "grateful",
        ],
    ),
    (
        "surprise",
        &[
            "surprise", "surprised", "surprising", "amazing", "amazed", "wow", "unexpected",
            "astonished", "shocked", "whoa",
        ],
    ),
    (
        "anger",
        &[
            "angry", "mad", "furious", "annoyed", "rage", "hate", "outraged", "irritated",
            "livid",
        ],
    ),
    (
        "fear",
        &[
            "scared", "afraid", "fear", "terrified", "anxious", "worried", "nervous",
            "frightened", "panic",
        ],
    ),
    (
        "disgust",
        &["disgust", "disgusting", "disgusted", "gross", "revolting", "nasty", "yuck"],
    ),
    (
        "sadness",
        &[
            "sad", "unhappy", "depressed", "miserable", "terrible", "awful", "lonely",
            "heartbroken", "cry", "crying", "grief", "sorry",
        ],
    ),
];

/// Offline classifier that counts emotion keywords.
#[derive(Clone, Debug, Default)]
pub struct KeywordTextEmotionModel;

impl KeywordTextEmotionModel {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(text: &str) -> &'static str {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|w| !w.is_empty())
            .collect();

        let mut best = ("neutral", 0usize);
        for (label, keywords) in KEYWORDS {
            let hits = words.iter().filter(|w| keywords.contains(*w)).count();
            if hits > best.1 {
                best = (*label, hits);
            }
        }
        best.0
    }
}

impl TextEmotionModel for KeywordTextEmotionModel {
    fn predict(&self, text: String) -> BoxFuture<'_, Result<EmotionResult, EmotionError>> {
        async move { Ok(EmotionResult::from_label(Self::classify(&text))) }.boxed()
    }
}

/// Text-classification model served by the Hugging Face Inference API.
#[derive(Clone)]
pub struct HfTextEmotionModel {
    client: HfInferenceClient,
    model: String,
}

impl HfTextEmotionModel {
    pub fn new(client: HfInferenceClient) -> Self {
        Self::with_model(client, DEFAULT_TEXT_EMOTION_MODEL)
    }

    pub fn with_model(client: HfInferenceClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

impl TextEmotionModel for HfTextEmotionModel {
    fn predict(&self, text: String) -> BoxFuture<'_, Result<EmotionResult, EmotionError>> {
        async move {
            let input: String = text.chars().take(HF_MAX_INPUT_CHARS).collect();
            let labels = self.client.classify_text(&self.model, &input).await?;
            let top = labels.into_iter().next().ok_or(EmotionError::EmptyPrediction)?;
            Ok(EmotionResult::from_label(top.label))
        }
        .boxed()
    }
}
