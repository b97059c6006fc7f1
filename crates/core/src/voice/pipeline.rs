use super::AudioAnalysisRecord;
use crate::asr::SpeechToTextModel;
use crate::dataset::DatasetEntry;
use crate::emotion::VoiceEmotionModel;
use crate::pipeline::{run_ordered, AnalysisError};
use crate::text::TextAnalysisPipeline;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct VoiceModels {
    pub speech_to_text: Arc<dyn SpeechToTextModel>,
    pub voice_emotion: Arc<dyn VoiceEmotionModel>,
}

/// Speech-to-text plus voice emotion, with the transcription run through a
/// full text pipeline.
#[derive(Clone)]
pub struct VoiceAnalysisPipeline {
    models: VoiceModels,
    text: TextAnalysisPipeline,
}

impl VoiceAnalysisPipeline {
    pub fn new(models: VoiceModels, text: TextAnalysisPipeline) -> Self {
        Self { models, text }
    }

    pub fn text_pipeline(&self) -> &TextAnalysisPipeline {
        &self.text
    }

    /// Analyses one file. The voice emotion branch runs concurrently with
    /// transcription and text analysis.
    pub async fn analyze(&self, audio_path: &Path) -> Result<AudioAnalysisRecord, AnalysisError> {
        let path = audio_path.to_path_buf();

        let text_branch = async {
            let transcription = self.models.speech_to_text.transcribe(path.clone()).await?;
            debug!(path = %path.display(), chars = transcription.len(), "transcribed");
            let record = self.text.analyze(&transcription).await?;
            Ok::<_, AnalysisError>((transcription, record))
        };
        let voice_branch = async {
            self.models
                .voice_emotion
                .predict(path.clone())
                .await
                .map_err(AnalysisError::from)
        };

        let ((transcription, text_analysis), voice_emotion) =
            futures::try_join!(text_branch, voice_branch)?;

        Ok(AudioAnalysisRecord {
            id: None,
            audio_path: path,
            transcription,
            voice_emotion,
            text_analysis,
            metadata: None,
        })
    }

    /// Analyses every file of `entry` in order and stamps each record with
    /// the entry's id and metadata.
    pub async fn analyze_many(
        &self,
        entry: &DatasetEntry,
    ) -> Result<Vec<AudioAnalysisRecord>, AnalysisError> {
        if entry.files.is_empty() {
            warn!(set_id = %entry.set_id, "entry has no audio files");
            return Ok(Vec::new());
        }
        let config = self.text.config();
        info!(set_id = %entry.set_id, files = entry.files.len(), "analysing audio set");
        let records = run_ordered(
            entry.files.clone(),
            config.concurrency,
            config.failure_policy,
            |file: PathBuf| async move { self.analyze(&file).await },
        )
        .await?;
        Ok(records.into_iter().map(|r| r.stamp(entry)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnalysisConfig, FailurePolicy};
    use crate::emotion::{Arousal, Valence};
    use crate::testing::{FixedVoiceEmotion, StemSpeechToText};
    use crate::text::TextModels;

    fn pipeline(policy: FailurePolicy) -> VoiceAnalysisPipeline {
        let config = AnalysisConfig {
            failure_policy: policy,
            ..AnalysisConfig::default()
        };
        VoiceAnalysisPipeline::new(
            VoiceModels {
                speech_to_text: Arc::new(StemSpeechToText),
                voice_emotion: Arc::new(FixedVoiceEmotion::new("hap", 0.87)),
            },
            TextAnalysisPipeline::new(TextModels::offline(), config),
        )
    }

    fn entry(files: &[&str]) -> DatasetEntry {
        DatasetEntry {
            set_id: "speaker_7".to_owned(),
            files: files.iter().map(PathBuf::from).collect(),
            text: "prompt".to_owned(),
            gender: "f".to_owned(),
            age: Some(29),
            country: "PT".to_owned(),
        }
    }

    #[tokio::test]
    async fn single_file_merges_branches() {
        let record = pipeline(FailurePolicy::FailFast)
            .analyze(Path::new("/data/s1/hello.wav"))
            .await
            .expect("analyze");
        assert_eq!(record.transcription, "hello made me so happy");
        assert_eq!(record.text_analysis.original_text, "hello made me so happy");
        assert_eq!(record.voice_emotion.label, "joy");
        assert_eq!(record.voice_emotion.valence, Valence::Positive);
        assert_eq!(record.voice_emotion.arousal, Arousal::High);
        assert_eq!(record.voice_emotion.score, Some(0.87));
        assert!(record.id.is_none());
        assert!(record.metadata.is_none());
    }

    #[tokio::test]
    async fn empty_entry_yields_nothing() {
        let records = pipeline(FailurePolicy::FailFast)
            .analyze_many(&entry(&[]))
            .await
            .expect("empty entry");
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn records_are_stamped_in_file_order() {
        let e = entry(&["/data/speaker_7/one.wav", "/data/speaker_7/two.wav"]);
        let records = pipeline(FailurePolicy::FailFast)
            .analyze_many(&e)
            .await
            .expect("analyze");
        assert_eq!(records.len(), 2);
        for (record, file) in records.iter().zip(&e.files) {
            assert_eq!(record.id.as_deref(), Some("speaker_7"));
            assert_eq!(&record.audio_path, file);
            let meta = record.metadata.as_ref().expect("metadata");
            assert_eq!(&meta.audio_path, file);
            assert_eq!(meta.set_id, "speaker_7");
            assert_eq!(meta.gender, "f");
            assert_eq!(meta.age, Some(29));
            assert_eq!(meta.country, "PT");
        }
        assert_eq!(records[0].transcription, "one made me so happy");
        assert_eq!(records[1].transcription, "two made me so happy");
    }

    #[tokio::test]
    async fn failing_file_follows_policy() {
        let e = entry(&["/d/a.wav", "/d/broken.wav", "/d/c.wav"]);
        let err = pipeline(FailurePolicy::FailFast)
            .analyze_many(&e)
            .await
            .expect_err("fail fast");
        assert!(matches!(err, AnalysisError::Asr(_)));

        let records = pipeline(FailurePolicy::SkipAndLog)
            .analyze_many(&e)
            .await
            .expect("skip");
        let paths: Vec<_> = records.iter().map(|r| r.audio_path.clone()).collect();
        assert_eq!(paths, vec![PathBuf::from("/d/a.wav"), PathBuf::from("/d/c.wav")]);
    }

    #[tokio::test]
    async fn json_shape_omits_unset_fields() {
        let record = pipeline(FailurePolicy::FailFast)
            .analyze(Path::new("clip.wav"))
            .await
            .expect("analyze");
        let json = serde_json::to_value(&record).expect("serialize");
        assert!(json.get("id").is_none());
        assert!(json.get("metadata").is_none());
        assert_eq!(json["voice_emotion"]["label"], "joy");
        assert_eq!(
            json["text_analysis"]["analysis"]["statement_type"],
            serde_json::json!(["affirmation", "personal"])
        );

        let stamped = record.stamp(&entry(&["clip.wav"]));
        let json = serde_json::to_value(&stamped).expect("serialize");
        assert_eq!(json["id"], "speaker_7");
        assert_eq!(json["metadata"]["country"], "PT");
    }
}
