use super::preprocess::truncate_chars;
use super::{
    LexiconSentimentAnalyzer, RuleBasedCorrector, SentimentAnalyzer, StatementTypeAnalyzer,
    TextAnalysis, TextCorrector, TextRecord, TokenStatementAnalyzer,
};
use crate::config::AnalysisConfig;
use crate::emotion::{KeywordTextEmotionModel, TextEmotionModel};
use crate::pipeline::{run_ordered, AnalysisError};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Model handles used by [`TextAnalysisPipeline`].
#[derive(Clone)]
pub struct TextModels {
    pub corrector: Arc<dyn TextCorrector>,
    pub sentiment: Arc<dyn SentimentAnalyzer>,
    pub emotion: Arc<dyn TextEmotionModel>,
    pub statement: Arc<dyn StatementTypeAnalyzer>,
}

impl TextModels {
    /// Rule, lexicon and keyword models; no network or model files.
    pub fn offline() -> Self {
        Self {
            corrector: Arc::new(RuleBasedCorrector::new()),
            sentiment: Arc::new(LexiconSentimentAnalyzer::new()),
            emotion: Arc::new(KeywordTextEmotionModel::new()),
            statement: Arc::new(TokenStatementAnalyzer::new()),
        }
    }
}

#[derive(Clone)]
pub struct TextAnalysisPipeline {
    models: TextModels,
    config: AnalysisConfig,
}

impl TextAnalysisPipeline {
    pub fn new(models: TextModels, config: AnalysisConfig) -> Self {
        Self { models, config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Truncate, correct, then score the corrected text.
    pub async fn analyze(&self, text: &str) -> Result<TextRecord, AnalysisError> {
        let original = truncate_chars(text, self.config.max_chars).to_owned();
        let corrected = self.models.corrector.correct(original.clone()).await?;
        debug!(chars = corrected.chars().count(), "text corrected");

        let sentiment = self
            .models
            .sentiment
            .analyze(&corrected, self.config.thresholds);
        let emotion = self.models.emotion.predict(corrected.clone()).await?;
        let statement_type = self
            .models
            .statement
            .analyze(&corrected, sentiment.subjectivity);
        debug!(
            polarity = sentiment.polarity,
            polarity_label = sentiment.polarity_label.as_str(),
            subjectivity = sentiment.subjectivity,
            subjectivity_label = sentiment.subjectivity_label.as_str(),
            emotion = %emotion.label,
            valence = emotion.valence.as_str(),
            arousal = emotion.arousal.as_str(),
            statement = %statement_type,
            "text analysed"
        );

        Ok(TextRecord {
            original_text: original,
            corrected_text: corrected,
            analysis: TextAnalysis {
                polarity: sentiment.polarity,
                subjectivity: sentiment.subjectivity,
                polarity_label: sentiment.polarity_label,
                subjectivity_label: sentiment.subjectivity_label,
                emotion,
                statement_type,
            },
        })
    }

    /// One record per input, in input order, subject to the failure policy.
    pub async fn analyze_many(&self, texts: Vec<String>) -> Result<Vec<TextRecord>, AnalysisError> {
        if texts.is_empty() {
            warn!("no texts to analyse");
            return Ok(Vec::new());
        }
        let total = texts.len();
        info!(total, concurrency = self.config.concurrency, "analysing texts");
        let records = run_ordered(
            texts,
            self.config.concurrency,
            self.config.failure_policy,
            |text| async move { self.analyze(&text).await },
        )
        .await?;
        info!(total, analysed = records.len(), "text analysis finished");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FailurePolicy;
    use crate::emotion::{Arousal, Valence};
    use crate::testing::{FailingCorrector, FailingTextEmotion};
    use crate::text::{PolarityLabel, SubjectivityLabel};

    fn offline() -> TextAnalysisPipeline {
        TextAnalysisPipeline::new(TextModels::offline(), AnalysisConfig::default())
    }

    #[tokio::test]
    async fn end_to_end_offline() {
        let record = offline()
            .analyze("I cant beleive this happened, im so happy!!")
            .await
            .expect("analyze");
        assert_eq!(record.original_text, "I cant beleive this happened, im so happy!!");
        assert_eq!(
            record.corrected_text,
            "I can't believe this happened, I'm so happy!!"
        );
        let a = &record.analysis;
        assert!(a.polarity > 0.2);
        assert_eq!(a.polarity_label, PolarityLabel::Positive);
        assert_eq!(a.subjectivity_label, SubjectivityLabel::Personal);
        assert_eq!(a.emotion.label, "joy");
        assert_eq!(a.emotion.valence, Valence::Positive);
        assert_eq!(a.emotion.arousal, Arousal::High);
        assert_eq!(a.statement_type.tags(), ["negation", "personal"]);
    }

    #[tokio::test]
    async fn long_text_is_cut_to_max_chars() {
        let text = "word ".repeat(600);
        let record = offline().analyze(&text).await.expect("analyze");
        assert_eq!(record.original_text.chars().count(), 2000);
        assert_eq!(record.original_text, text.chars().take(2000).collect::<String>());
    }

    #[tokio::test]
    async fn analysis_is_idempotent() {
        let pipeline = offline();
        let text = "The service was not good, we waited an hour.";
        let first = pipeline.analyze(text).await.expect("first");
        let second = pipeline.analyze(text).await.expect("second");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn labels_agree_with_scores() {
        let pipeline = offline();
        for text in [
            "This is terrible and awful!",
            "The report was published on time.",
            "We had a great day",
            "",
        ] {
            let a = pipeline.analyze(text).await.expect("analyze").analysis;
            assert!((-1.0..=1.0).contains(&a.polarity));
            assert!((0.0..=1.0).contains(&a.subjectivity));
            let neutral = a.polarity.abs() <= 0.2;
            assert_eq!(a.polarity_label == PolarityLabel::Neutral, neutral, "{text:?}");
            assert_eq!(
                a.subjectivity_label == SubjectivityLabel::Personal,
                a.subjectivity > 0.5,
                "{text:?}"
            );
        }
    }

    #[tokio::test]
    async fn many_keeps_order() {
        let texts = vec![
            "We had a great day".to_owned(),
            "This is terrible".to_owned(),
            "The train left at noon".to_owned(),
        ];
        let config = AnalysisConfig::default()
            .with_concurrency(3)
            .expect("valid");
        let pipeline = TextAnalysisPipeline::new(TextModels::offline(), config);
        let records = pipeline.analyze_many(texts.clone()).await.expect("many");
        let originals: Vec<_> = records.iter().map(|r| r.original_text.clone()).collect();
        assert_eq!(originals, texts);
    }

    #[tokio::test]
    async fn empty_batch_is_empty() {
        let records = offline().analyze_many(Vec::new()).await.expect("empty");
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn correction_failure_propagates() {
        let models = TextModels {
            corrector: Arc::new(FailingCorrector),
            ..TextModels::offline()
        };
        let pipeline = TextAnalysisPipeline::new(models, AnalysisConfig::default());
        let err = pipeline.analyze("some text").await.expect_err("fails");
        assert!(matches!(err, AnalysisError::Correction(_)));
    }

    #[tokio::test]
    async fn failure_policy_controls_batch() {
        let models = TextModels {
            emotion: Arc::new(FailingTextEmotion::on("boom")),
            ..TextModels::offline()
        };
        let texts = vec![
            "first fine text".to_owned(),
            "and this one goes boom".to_owned(),
            "third fine text".to_owned(),
        ];

        let fail_fast = TextAnalysisPipeline::new(models.clone(), AnalysisConfig::default());
        let err = fail_fast
            .analyze_many(texts.clone())
            .await
            .expect_err("fail fast");
        assert!(matches!(err, AnalysisError::Emotion(_)));
        let capitalized = fail_fast
            .analyze("boom at the start")
            .await
            .expect_err("marker survives capitalization");
        assert!(matches!(capitalized, AnalysisError::Emotion(_)));

        let config = AnalysisConfig {
            failure_policy: FailurePolicy::SkipAndLog,
            ..AnalysisConfig::default()
        };
        let skipping = TextAnalysisPipeline::new(models, config);
        let records = skipping.analyze_many(texts).await.expect("skip");
        let originals: Vec<_> = records.iter().map(|r| r.original_text.as_str()).collect();
        assert_eq!(originals, vec!["first fine text", "third fine text"]);
    }

    #[tokio::test]
    async fn ordinary_words_survive_correction() {
        let record = offline()
            .analyze("The patient was ill for three days.")
            .await
            .expect("analyze");
        assert_eq!(record.corrected_text, "The patient was ill for three days.");
        assert_eq!(record.analysis.statement_type.tags(), ["affirmation", "factual"]);
    }
}
