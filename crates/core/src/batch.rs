//! Runs configuration entries end to end: load dataset, analyse, save, report.

use crate::config::{
    AnalysisConfig, ConfigError, Mode, RunConfig, DEFAULT_AUDIO_ROOT, DEFAULT_RESULTS_DIR,
    DEFAULT_TEXT_COLUMN,
};
use crate::dataset::{load_audio_dataset, load_texts, DatasetError};
use crate::models::{ModelError, ModelSettings};
use crate::pipeline::AnalysisError;
use crate::report::{render_audio_results, render_text_results};
use crate::results::save_results;
use crate::text::TextAnalysisPipeline;
use crate::voice::VoiceAnalysisPipeline;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

#[derive(thiserror::Error, Debug)]
pub enum BatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Models(#[from] ModelError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error("failed to convert results: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Clone, Debug)]
pub struct BatchSettings {
    pub results_dir: PathBuf,
    pub audio_root: PathBuf,
    pub text_column: String,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            audio_root: PathBuf::from(DEFAULT_AUDIO_ROOT),
            text_column: DEFAULT_TEXT_COLUMN.to_owned(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RunOutcome {
    pub mode: Mode,
    pub records: Vec<Value>,
    /// `None` when nothing was analysed or saving failed.
    pub saved_to: Option<PathBuf>,
    pub report: String,
}

/// Drives run configurations. Pipelines are built on first use and reused
/// for every later configuration.
pub struct BatchRunner {
    models: ModelSettings,
    analysis: AnalysisConfig,
    settings: BatchSettings,
    text: OnceCell<TextAnalysisPipeline>,
    voice: OnceCell<VoiceAnalysisPipeline>,
}

fn to_values<T: Serialize>(records: &[T]) -> Result<Vec<Value>, serde_json::Error> {
    records.iter().map(serde_json::to_value).collect()
}

impl BatchRunner {
    pub fn new(models: ModelSettings, analysis: AnalysisConfig, settings: BatchSettings) -> Self {
        Self {
            models,
            analysis,
            settings,
            text: OnceCell::new(),
            voice: OnceCell::new(),
        }
    }

    /// Uses ready-made pipelines instead of building them from settings.
    pub fn with_pipelines(
        settings: BatchSettings,
        text: TextAnalysisPipeline,
        voice: Option<VoiceAnalysisPipeline>,
    ) -> Self {
        let analysis = text.config().clone();
        Self {
            models: ModelSettings::default(),
            analysis,
            settings,
            text: OnceCell::new_with(Some(text)),
            voice: OnceCell::new_with(voice),
        }
    }

    async fn text_pipeline(&self) -> Result<&TextAnalysisPipeline, BatchError> {
        self.text
            .get_or_try_init(|| async {
                let models = self.models.text_models()?;
                Ok::<_, BatchError>(TextAnalysisPipeline::new(models, self.analysis.clone()))
            })
            .await
    }

    async fn voice_pipeline(&self) -> Result<&VoiceAnalysisPipeline, BatchError> {
        self.voice
            .get_or_try_init(|| async {
                let text = self.text_pipeline().await?.clone();
                let models = self.models.voice_models()?;
                Ok::<_, BatchError>(VoiceAnalysisPipeline::new(models, text))
            })
            .await
    }

    pub async fn run(&self, config: &RunConfig) -> Result<RunOutcome, BatchError> {
        let mode = config.mode()?;
        let name = config.dataset_name();
        info!(
            dataset = %config.dataset.display(),
            %mode,
            limit = ?config.limit,
            random = config.random,
            "running configuration"
        );

        let (records, report) = match mode {
            Mode::Text => {
                let texts = load_texts(
                    &config.dataset,
                    &self.settings.text_column,
                    config.limit,
                    config.random,
                )?;
                if texts.is_empty() {
                    warn!(dataset = %name, "no texts to analyse");
                    return Ok(Self::empty(mode));
                }
                let records = self.text_pipeline().await?.analyze_many(texts).await?;
                let values = to_values(&records)?;
                let report = render_text_results(&values);
                (values, report)
            }
            Mode::Audio => {
                let entries = load_audio_dataset(
                    &config.dataset,
                    &self.settings.audio_root,
                    config.limit,
                    config.random,
                )?;
                if entries.is_empty() {
                    warn!(dataset = %name, "no audio files to analyse");
                    return Ok(Self::empty(mode));
                }
                let pipeline = self.voice_pipeline().await?;
                let mut records = Vec::new();
                for (i, entry) in entries.iter().enumerate() {
                    info!(
                        entry = i + 1,
                        total = entries.len(),
                        set_id = %entry.set_id,
                        "analysing entry"
                    );
                    records.extend(pipeline.analyze_many(entry).await?);
                }
                let values = to_values(&records)?;
                let report = render_audio_results(&values);
                (values, report)
            }
        };

        let saved_to = save_results(&records, &self.settings.results_dir, &name);
        Ok(RunOutcome {
            mode,
            records,
            saved_to,
            report,
        })
    }

    fn empty(mode: Mode) -> RunOutcome {
        RunOutcome {
            mode,
            records: Vec::new(),
            saved_to: None,
            report: String::new(),
        }
    }

    /// Runs every configuration of one group. Failing configurations are
    /// logged and skipped; returns the outcomes that completed.
    pub async fn run_group(&self, name: &str, configs: &[RunConfig]) -> Vec<RunOutcome> {
        let mut outcomes = Vec::new();
        for (i, config) in configs.iter().enumerate() {
            info!(
                group = name,
                configuration = i + 1,
                total = configs.len(),
                "starting configuration"
            );
            match self.run(config).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => error!(
                    group = name,
                    configuration = i + 1,
                    dataset = %config.dataset.display(),
                    error = %e,
                    "configuration failed"
                ),
            }
        }
        info!(
            group = name,
            completed = outcomes.len(),
            total = configs.len(),
            "group finished"
        );
        outcomes
    }
}
