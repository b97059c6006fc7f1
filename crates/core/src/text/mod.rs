mod correct;
mod pipeline;
pub mod preprocess;
mod sentiment;
mod statement;
pub mod tokenize;

use crate::emotion::EmotionResult;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub use correct::{CorrectionError, LanguageToolCorrector, RuleBasedCorrector, TextCorrector};
pub use pipeline::{TextAnalysisPipeline, TextModels};
pub use sentiment::{
    polarity_label, subjectivity_label, LexiconSentimentAnalyzer, Sentiment, SentimentAnalyzer,
};
pub use statement::{StatementTypeAnalyzer, TokenStatementAnalyzer, FIRST_PERSON_PRONOUNS};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PolarityLabel {
    Negative,
    Neutral,
    Positive,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubjectivityLabel {
    Factual,
    Personal,
}

impl PolarityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolarityLabel::Negative => "negative",
            PolarityLabel::Neutral => "neutral",
            PolarityLabel::Positive => "positive",
        }
    }
}

impl SubjectivityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectivityLabel::Factual => "factual",
            SubjectivityLabel::Personal => "personal",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stance {
    Negation,
    Affirmation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Personal,
    Factual,
}

/// Statement tags: always one stance and one orientation.
///
/// Serializes as a two-element array, stance first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatementType {
    pub stance: Stance,
    pub orientation: Orientation,
}

impl StatementType {
    pub fn tags(&self) -> [&'static str; 2] {
        let stance = match self.stance {
            Stance::Negation => "negation",
            Stance::Affirmation => "affirmation",
        };
        let orientation = match self.orientation {
            Orientation::Personal => "personal",
            Orientation::Factual => "factual",
        };
        [stance, orientation]
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags().contains(&tag)
    }

    /// Rebuilds the tags from an unordered list; rejects missing, duplicated
    /// or contradictory tags.
    pub fn from_tags<'a, I>(tags: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut stance = None;
        let mut orientation = None;
        for tag in tags {
            let (slot_is_stance, set) = match tag {
                "negation" => (true, stance.replace(Stance::Negation).is_some()),
                "affirmation" => (true, stance.replace(Stance::Affirmation).is_some()),
                "personal" => (false, orientation.replace(Orientation::Personal).is_some()),
                "factual" => (false, orientation.replace(Orientation::Factual).is_some()),
                other => return Err(format!("unknown statement tag {other:?}")),
            };
            if set {
                let axis = if slot_is_stance { "stance" } else { "orientation" };
                return Err(format!("more than one {axis} tag"));
            }
        }
        match (stance, orientation) {
            (Some(stance), Some(orientation)) => Ok(Self {
                stance,
                orientation,
            }),
            _ => Err("statement type needs one stance and one orientation tag".to_owned()),
        }
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b] = self.tags();
        write!(f, "{a}, {b}")
    }
}

impl Serialize for StatementType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.tags())
    }
}

impl<'de> Deserialize<'de> for StatementType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tags = Vec::<String>::deserialize(deserializer)?;
        Self::from_tags(tags.iter().map(String::as_str)).map_err(de::Error::custom)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TextAnalysis {
    pub polarity: f64,
    pub subjectivity: f64,
    pub polarity_label: PolarityLabel,
    pub subjectivity_label: SubjectivityLabel,
    pub emotion: EmotionResult,
    pub statement_type: StatementType,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TextRecord {
    pub original_text: String,
    pub corrected_text: String,
    pub analysis: TextAnalysis,
}
