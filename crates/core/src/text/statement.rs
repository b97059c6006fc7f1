use super::tokenize::tokenize;
use super::{Orientation, Stance, StatementType};

pub const FIRST_PERSON_PRONOUNS: &[&str] = &["i", "me", "my", "mine", "we", "us", "our"];

const NEGATION_TOKENS: &[&str] = &["not", "n't", "nt", "never"];

// Subjectivity above this marks a statement personal even without pronouns.
const PERSONAL_SUBJECTIVITY: f64 = 0.5;

pub trait StatementTypeAnalyzer: Send + Sync {
    /// `subjectivity` is the score already computed for the same text.
    fn analyze(&self, text: &str, subjectivity: f64) -> StatementType;
}

/// Tags statements from the clitic-splitting tokenizer.
#[derive(Clone, Debug, Default)]
pub struct TokenStatementAnalyzer;

impl TokenStatementAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl StatementTypeAnalyzer for TokenStatementAnalyzer {
    fn analyze(&self, text: &str, subjectivity: f64) -> StatementType {
        let tokens: Vec<String> = tokenize(text).iter().map(|t| t.to_lowercase()).collect();

        let stance = if tokens.iter().any(|t| NEGATION_TOKENS.contains(&t.as_str())) {
            Stance::Negation
        } else {
            Stance::Affirmation
        };
        let has_pronoun = tokens
            .iter()
            .any(|t| FIRST_PERSON_PRONOUNS.contains(&t.as_str()));
        let orientation = if has_pronoun || subjectivity > PERSONAL_SUBJECTIVITY {
            Orientation::Personal
        } else {
            Orientation::Factual
        };

        StatementType {
            stance,
            orientation,
        }
    }
}
