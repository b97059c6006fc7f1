//! CSV dataset loading for both run modes.

use crate::config::DEFAULT_MIN_WORDS;
use crate::text::preprocess::{clean_text, has_min_words};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// One speaker set: a folder of recordings plus the CSV row describing it.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatasetEntry {
    pub set_id: String,
    pub files: Vec<PathBuf>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub country: String,
}

#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {source}")]
    Csv {
        path: PathBuf,
        source: csv::Error,
    },
    #[error("column {column:?} not found in {path}")]
    MissingColumn { path: PathBuf, column: String },
}

struct CsvTable {
    headers: Vec<String>,
    rows: Vec<csv::StringRecord>,
}

impl CsvTable {
    fn read(path: &Path) -> Result<Self, DatasetError> {
        let csv_err = |source| DatasetError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(csv_err)?;
        let headers = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(|h| h.trim().to_owned())
            .collect();
        let rows = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(csv_err)?;
        Ok(Self { headers, rows })
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn require(&self, path: &Path, name: &str) -> Result<usize, DatasetError> {
        self.column(name).ok_or_else(|| DatasetError::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_owned(),
        })
    }
}

fn field(row: &csv::StringRecord, idx: Option<usize>) -> String {
    idx.and_then(|i| row.get(i))
        .map(|v| v.trim().to_owned())
        .unwrap_or_default()
}

// Accepts "34" and the "34.0" spreadsheets tend to produce.
fn parse_age(raw: &str) -> Option<u32> {
    let value: f64 = raw.trim().parse().ok()?;
    (value.is_finite() && value >= 0.0 && value <= f64::from(u32::MAX)).then(|| value as u32)
}

/// Cleaned texts from `column` with at least five words, stopping at `limit`.
pub fn load_texts(
    path: &Path,
    column: &str,
    limit: Option<usize>,
    random: bool,
) -> Result<Vec<String>, DatasetError> {
    let mut table = CsvTable::read(path)?;
    let idx = table.require(path, column)?;
    if random {
        table.rows.shuffle(&mut rand::rng());
    }

    let mut texts = Vec::new();
    for row in &table.rows {
        let cleaned = clean_text(row.get(idx).unwrap_or_default());
        if has_min_words(&cleaned, DEFAULT_MIN_WORDS) {
            texts.push(cleaned);
        }
        if limit.is_some_and(|l| texts.len() >= l) {
            break;
        }
    }
    info!(path = %path.display(), rows = table.rows.len(), kept = texts.len(), "texts loaded");
    Ok(texts)
}

/// Sorted `*.wav` files directly inside `folder`.
pub fn list_wav_files(folder: &Path) -> Vec<PathBuf> {
    WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
        })
        .collect()
}

/// Entries for rows whose `audio_root/<set_id>` folder holds WAV files.
///
/// `limit` caps the rows considered (a random sample when `random`), before
/// rows without recordings are dropped.
pub fn load_audio_dataset(
    path: &Path,
    audio_root: &Path,
    limit: Option<usize>,
    random: bool,
) -> Result<Vec<DatasetEntry>, DatasetError> {
    let mut table = CsvTable::read(path)?;
    let set_idx = table.require(path, "set_id")?;
    let text_idx = table.column("text");
    let gender_idx = table.column("gender");
    let age_idx = table.column("age");
    let country_idx = table.column("country");

    if let Some(limit) = limit {
        if random {
            table.rows.shuffle(&mut rand::rng());
        }
        table.rows.truncate(limit);
    }

    let mut entries = Vec::new();
    for row in &table.rows {
        let set_id = field(row, Some(set_idx));
        if set_id.is_empty() {
            continue;
        }
        let folder = audio_root.join(&set_id);
        if !folder.is_dir() {
            debug!(folder = %folder.display(), "audio folder missing, skipping row");
            continue;
        }
        let files = list_wav_files(&folder);
        if files.is_empty() {
            debug!(folder = %folder.display(), "no wav files, skipping row");
            continue;
        }
        entries.push(DatasetEntry {
            set_id,
            files,
            text: field(row, text_idx),
            gender: field(row, gender_idx),
            age: parse_age(&field(row, age_idx)),
            country: field(row, country_idx),
        });
    }
    info!(
        path = %path.display(),
        rows = table.rows.len(),
        entries = entries.len(),
        "audio dataset loaded"
    );
    Ok(entries)
}
