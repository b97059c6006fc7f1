mod pipeline;

use crate::dataset::DatasetEntry;
use crate::emotion::EmotionResult;
use crate::text::TextRecord;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use pipeline::{VoiceAnalysisPipeline, VoiceModels};

/// Speaker metadata copied from the dataset row onto each record.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AudioMetadata {
    pub audio_path: PathBuf,
    pub set_id: String,
    pub gender: String,
    pub age: Option<u32>,
    pub country: String,
}

impl AudioMetadata {
    pub fn from_entry(entry: &DatasetEntry, audio_path: &Path) -> Self {
        Self {
            audio_path: audio_path.to_path_buf(),
            set_id: entry.set_id.clone(),
            gender: entry.gender.clone(),
            age: entry.age,
            country: entry.country.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AudioAnalysisRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub audio_path: PathBuf,
    pub transcription: String,
    pub voice_emotion: EmotionResult,
    pub text_analysis: TextRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AudioMetadata>,
}

impl AudioAnalysisRecord {
    /// Tags the record with the entry it came from.
    pub fn stamp(mut self, entry: &DatasetEntry) -> Self {
        self.id = Some(entry.set_id.clone());
        self.metadata = Some(AudioMetadata::from_entry(entry, &self.audio_path));
        self
    }
}
