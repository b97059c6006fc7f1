use super::tokenize::tokenize;
use super::{PolarityLabel, SubjectivityLabel};
use crate::config::SentimentThresholds;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Sentiment {
    pub polarity: f64,
    pub subjectivity: f64,
    pub polarity_label: PolarityLabel,
    pub subjectivity_label: SubjectivityLabel,
}

impl Sentiment {
    pub fn from_scores(polarity: f64, subjectivity: f64, thresholds: SentimentThresholds) -> Self {
        Self {
            polarity,
            subjectivity,
            polarity_label: polarity_label(polarity, thresholds.polarity),
            subjectivity_label: subjectivity_label(subjectivity, thresholds.subjectivity),
        }
    }
}

/// `neutral` when `|polarity| <= threshold`, otherwise the sign decides.
pub fn polarity_label(polarity: f64, threshold: f64) -> PolarityLabel {
    if polarity.abs() <= threshold {
        PolarityLabel::Neutral
    } else if polarity > 0.0 {
        PolarityLabel::Positive
    } else {
        PolarityLabel::Negative
    }
}

pub fn subjectivity_label(subjectivity: f64, threshold: f64) -> SubjectivityLabel {
    if subjectivity > threshold {
        SubjectivityLabel::Personal
    } else {
        SubjectivityLabel::Factual
    }
}

pub trait SentimentAnalyzer: Send + Sync {
    fn analyze(&self, text: &str, thresholds: SentimentThresholds) -> Sentiment;
}

// (word, polarity, subjectivity)
const LEXICON: &[(&str, f64, f64)] = &[
    ("amazing", 0.6, 0.9),
    ("awesome", 1.0, 1.0),
    ("beautiful", 0.85, 1.0),
    ("best", 1.0, 0.3),
    ("better", 0.5, 0.5),
    ("brilliant", 0.9, 1.0),
    ("delighted", 0.7, 0.8),
    ("enjoy", 0.4, 0.5),
    ("excellent", 1.0, 1.0),
    ("excited", 0.4, 0.8),
    ("fantastic", 0.4, 0.9),
    ("fine", 0.4, 0.5),
    ("fun", 0.3, 0.2),
    ("glad", 0.5, 1.0),
    ("good", 0.7, 0.6),
    ("great", 0.8, 0.75),
    ("happy", 0.8, 1.0),
    ("love", 0.5, 0.6),
    ("loved", 0.7, 0.8),
    ("lovely", 0.5, 0.75),
    ("nice", 0.6, 1.0),
    ("perfect", 1.0, 1.0),
    ("pleased", 0.5, 1.0),
    ("recommend", 0.3, 0.4),
    ("thanks", 0.2, 0.2),
    ("wonderful", 1.0, 1.0),
    ("angry", -0.5, 1.0),
    ("annoying", -0.8, 0.9),
    ("awful", -1.0, 1.0),
    ("bad", -0.7, 0.67),
    ("boring", -1.0, 1.0),
    ("broken", -0.4, 0.4),
    ("disappointed", -0.75, 0.75),
    ("disappointing", -0.6, 0.7),
    ("disgusting", -1.0, 1.0),
    ("hate", -0.8, 0.9),
    ("horrible", -1.0, 1.0),
    ("poor", -0.4, 0.6),
    ("sad", -0.5, 1.0),
    ("scared", -0.5, 0.9),
    ("terrible", -1.0, 1.0),
    ("ugly", -0.7, 1.0),
    ("upset", -0.5, 0.8),
    ("useless", -0.5, 0.2),
    ("worse", -0.4, 0.6),
    ("worst", -1.0, 1.0),
    ("wrong", -0.5, 0.9),
    ("important", 0.4, 1.0),
    ("interesting", 0.5, 0.5),
    ("new", 0.14, 0.45),
    ("old", 0.1, 0.2),
    ("strange", 0.0, 0.15),
    ("surprised", 0.1, 0.6),
    ("think", 0.0, 0.3),
    ("feel", 0.0, 0.4),
];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("so", 1.3),
    ("really", 1.3),
    ("too", 1.3),
    ("quite", 1.1),
    ("extremely", 1.5),
    ("incredibly", 1.5),
    ("absolutely", 1.5),
];

const NEGATORS: &[&str] = &["not", "n't", "nt", "never", "no"];

const NEGATION_FACTOR: f64 = -0.5;

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Lexicon scorer over the clitic-splitting tokenizer.
///
/// Polarity and subjectivity are the means over scored words. A run of
/// intensifiers multiplies the next scored word; a negator directly before a
/// scored word (intensifiers in between are allowed) flips and halves its
/// polarity. Up to three exclamation marks add 10% polarity each.
#[derive(Clone, Debug, Default)]
pub struct LexiconSentimentAnalyzer;

impl LexiconSentimentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn scores(&self, text: &str) -> (f64, f64) {
        let mut polarities = Vec::new();
        let mut subjectivities = Vec::new();
        let mut intensity: f64 = 1.0;
        let mut negated = false;

        for token in tokenize(text) {
            let lower = token.to_lowercase();
            if let Some((_, factor)) = INTENSIFIERS.iter().find(|(w, _)| *w == lower) {
                intensity *= *factor;
                continue;
            }
            if NEGATORS.contains(&lower.as_str()) {
                negated = true;
                continue;
            }
            if let Some((_, p, s)) = LEXICON.iter().find(|(w, _, _)| *w == lower) {
                let mut polarity = *p * intensity;
                if negated {
                    polarity *= NEGATION_FACTOR;
                }
                polarities.push(polarity);
                subjectivities.push(*s * intensity);
            }
            intensity = 1.0;
            negated = false;
        }

        if polarities.is_empty() {
            return (0.0, 0.0);
        }
        let n = polarities.len() as f64;
        let mut polarity = polarities.iter().sum::<f64>() / n;
        let subjectivity = subjectivities.iter().sum::<f64>() / n;

        let exclamations = text.chars().filter(|c| *c == '!').count().min(3);
        polarity *= 1.0 + 0.1 * exclamations as f64;

        (
            round3(polarity.clamp(-1.0, 1.0)),
            round3(subjectivity.clamp(0.0, 1.0)),
        )
    }
}

impl SentimentAnalyzer for LexiconSentimentAnalyzer {
    fn analyze(&self, text: &str, thresholds: SentimentThresholds) -> Sentiment {
        let (polarity, subjectivity) = self.scores(text);
        Sentiment::from_scores(polarity, subjectivity, thresholds)
    }
}
