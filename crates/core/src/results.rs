//! Persisting analysis records and loading them (or run configs) back.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use walkdir::WalkDir;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("path not found: {0}")]
    NotFound(PathBuf),
    #[error("no JSON files found in {0}")]
    NoJsonFiles(PathBuf),
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{0} does not contain a JSON object or array")]
    UnexpectedShape(PathBuf),
    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// Stem used to name a loaded file's group.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_owned()
}

fn write_results<T: Serialize>(
    records: &[T],
    results_dir: &Path,
    name: &str,
) -> Result<PathBuf, ResultsError> {
    fs::create_dir_all(results_dir).map_err(|source| ResultsError::Io {
        path: results_dir.to_path_buf(),
        source,
    })?;
    let millis = chrono::Utc::now().timestamp_millis();
    let path = results_dir.join(format!("{name}_{millis}.json"));
    let body = serde_json::to_string_pretty(records)?;
    fs::write(&path, body).map_err(|source| ResultsError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Writes `records` as a pretty JSON array to
/// `<results_dir>/<name>_<epoch millis>.json`.
///
/// Failures are logged and reported as `None`; they never abort a run.
pub fn save_results<T: Serialize>(
    records: &[T],
    results_dir: &Path,
    name: &str,
) -> Option<PathBuf> {
    match write_results(records, results_dir, name) {
        Ok(path) => {
            info!(path = %path.display(), count = records.len(), "results saved");
            Some(path)
        }
        Err(e) => {
            error!(dir = %results_dir.display(), name, error = %e, "failed to save results");
            None
        }
    }
}

/// Reads a JSON file holding either one object or an array of items.
pub fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ResultsError> {
    let raw = fs::read_to_string(path).map_err(|source| ResultsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let json_err = |source| ResultsError::Json {
        path: path.to_path_buf(),
        source,
    };
    let value: Value = serde_json::from_str(&raw).map_err(json_err)?;
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(json_err))
            .collect(),
        Value::Object(_) => Ok(vec![serde_json::from_value(value).map_err(json_err)?]),
        _ => Err(ResultsError::UnexpectedShape(path.to_path_buf())),
    }
}

/// Expands each input into its JSON files: a file stands for itself (and is
/// ignored unless it ends in `.json`), a directory is searched recursively.
pub fn find_json_files(inputs: &[PathBuf]) -> Result<Vec<Vec<PathBuf>>, ResultsError> {
    let mut groups = Vec::new();
    for input in inputs {
        if !input.exists() {
            return Err(ResultsError::NotFound(input.clone()));
        }
        if input.is_file() {
            if is_json(input) {
                groups.push(vec![input.clone()]);
            }
            continue;
        }
        let found: Vec<PathBuf> = WalkDir::new(input)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file() && is_json(e.path()))
            .map(|e| e.into_path())
            .collect();
        if found.is_empty() {
            return Err(ResultsError::NoJsonFiles(input.clone()));
        }
        groups.push(found);
    }
    Ok(groups)
}

/// Loads every JSON file under `inputs` as `(file stem, items)`, in discovery
/// order. Files that fail to load are logged and left out.
pub fn load_jsons<T: DeserializeOwned>(
    inputs: &[PathBuf],
) -> Result<Vec<(String, Vec<T>)>, ResultsError> {
    let mut loaded = Vec::new();
    for path in find_json_files(inputs)?.into_iter().flatten() {
        let name = file_stem(&path);
        match load_json_file(&path) {
            Ok(items) => {
                info!(name = %name, entries = items.len(), "loaded json file");
                loaded.push((name, items));
            }
            Err(e) => error!(name = %name, error = %e, "failed to load json file"),
        }
    }
    info!(files = loaded.len(), "json files loaded");
    Ok(loaded)
}
