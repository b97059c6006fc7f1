use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, str::FromStr};

pub const DEFAULT_MAX_CHARS: usize = 2000;
pub const DEFAULT_POLARITY_THRESHOLD: f64 = 0.2;
pub const DEFAULT_SUBJECTIVITY_THRESHOLD: f64 = 0.5;
pub const DEFAULT_MIN_WORDS: usize = 5;
pub const DEFAULT_TEXT_COLUMN: &str = "text";
pub const DEFAULT_AUDIO_ROOT: &str = "datasets/audio/files";
pub const DEFAULT_RESULTS_DIR: &str = "results";
pub const DEFAULT_HF_ENDPOINT: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_WHISPER_MODEL: &str = "models/ggml-base.bin";
pub const ENV_HF_API_TOKEN: &str = "HF_API_TOKEN";
pub const ENV_HF_ENDPOINT: &str = "HF_ENDPOINT";
pub const ENV_AFFECT_DEVICE: &str = "AFFECT_DEVICE";
pub const ENV_LANGUAGETOOL_URL: &str = "LANGUAGETOOL_URL";
pub const ENV_CUDA_VISIBLE_DEVICES: &str = "CUDA_VISIBLE_DEVICES";

/// Compute device the model backends run on.
///
/// Resolved once at process start and handed to every backend constructor.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Cpu,
    Cuda,
}

impl Device {
    pub fn is_accelerated(&self) -> bool {
        matches!(self, Device::Cuda)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
        }
    }

    /// Looks for a usable CUDA device, falling back to the CPU.
    pub fn probe(env: &impl Env) -> Self {
        let visible = env
            .var(ENV_CUDA_VISIBLE_DEVICES)
            .map(|v| {
                let v = v.trim().to_owned();
                !v.is_empty() && v != "-1"
            })
            .unwrap_or(false);
        if visible || std::path::Path::new("/dev/nvidia0").exists() {
            Device::Cuda
        } else {
            Device::Cpu
        }
    }

    /// CLI value, then `AFFECT_DEVICE`, then [`Device::probe`].
    pub fn resolve(cli_value: Option<String>, env: &impl Env) -> Result<Self, ConfigError> {
        match resolve_optional_string(cli_value, ENV_AFFECT_DEVICE, env) {
            Some(v) if v.trim().eq_ignore_ascii_case("auto") => Ok(Self::probe(env)),
            Some(v) => v.parse(),
            None => Ok(Self::probe(env)),
        }
    }
}

impl FromStr for Device {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Device::Cpu),
            "cuda" | "gpu" => Ok(Device::Cuda),
            other => Err(ConfigError::InvalidDevice(other.to_owned())),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct SentimentThresholds {
    pub polarity: f64,
    pub subjectivity: f64,
}

impl SentimentThresholds {
    pub fn new(polarity: f64, subjectivity: f64) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&polarity) {
            return Err(ConfigError::ThresholdOutOfRange {
                name: "polarity",
                value: polarity,
            });
        }
        if !(0.0..=1.0).contains(&subjectivity) {
            return Err(ConfigError::ThresholdOutOfRange {
                name: "subjectivity",
                value: subjectivity,
            });
        }
        Ok(Self {
            polarity,
            subjectivity,
        })
    }
}

impl Default for SentimentThresholds {
    fn default() -> Self {
        Self {
            polarity: DEFAULT_POLARITY_THRESHOLD,
            subjectivity: DEFAULT_SUBJECTIVITY_THRESHOLD,
        }
    }
}

/// What a batch does when one item fails inside a model call.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abort the whole batch on the first failing item.
    #[default]
    FailFast,
    /// Log the failing item and keep going.
    SkipAndLog,
}

impl FromStr for FailurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" | "fail-fast" => Ok(FailurePolicy::FailFast),
            "skip" | "skip-and-log" => Ok(FailurePolicy::SkipAndLog),
            other => Err(ConfigError::InvalidFailurePolicy(other.to_owned())),
        }
    }
}

/// Which family of model backends the pipelines are built from.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Offline rule/lexicon models plus local Whisper for speech.
    #[default]
    Local,
    /// Hugging Face Inference API.
    Hf,
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Backend::Local),
            "hf" | "huggingface" => Ok(Backend::Hf),
            other => Err(ConfigError::InvalidBackend(other.to_owned())),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Text,
    Audio,
}

impl FromStr for Mode {
    type Err = ConfigError;

    /// Exact match only: `"Text"` or `" audio"` are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Mode::Text),
            "audio" => Ok(Mode::Audio),
            other => Err(ConfigError::InvalidMode(other.to_owned())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Text => f.write_str("text"),
            Mode::Audio => f.write_str("audio"),
        }
    }
}

/// One entry of a run configuration file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunConfig {
    pub dataset: PathBuf,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub random: bool,
}

impl RunConfig {
    pub fn mode(&self) -> Result<Mode, ConfigError> {
        match self.mode.as_deref() {
            Some(m) => m.parse(),
            None => Err(ConfigError::MissingMode),
        }
    }

    /// File stem of the dataset, used to name result files.
    pub fn dataset_name(&self) -> String {
        self.dataset
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("dataset")
            .to_owned()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisConfig {
    pub max_chars: usize,
    pub thresholds: SentimentThresholds,
    pub failure_policy: FailurePolicy,
    pub concurrency: usize,
    pub device: Device,
}

impl AnalysisConfig {
    pub fn with_concurrency(mut self, concurrency: usize) -> Result<Self, ConfigError> {
        if concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        self.concurrency = concurrency;
        Ok(self)
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Result<Self, ConfigError> {
        if max_chars == 0 {
            return Err(ConfigError::ZeroMaxChars);
        }
        self.max_chars = max_chars;
        Ok(self)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            thresholds: SentimentThresholds::default(),
            failure_policy: FailurePolicy::default(),
            concurrency: 1,
            device: Device::default(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(v))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(**redacted**)")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HfConfig {
    pub endpoint: String,
    pub api_token: Option<ApiKey>,
}

impl Default for HfConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_HF_ENDPOINT.to_owned(),
            api_token: None,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("api key must not be empty")]
    EmptyApiKey,
    #[error("run configuration has no mode; provide 'text' or 'audio'")]
    MissingMode,
    #[error("invalid mode {0:?}; provide 'text' or 'audio'")]
    InvalidMode(String),
    #[error("invalid device {0:?}; expected cpu, cuda or auto")]
    InvalidDevice(String),
    #[error("invalid failure policy {0:?}; expected fail or skip")]
    InvalidFailurePolicy(String),
    #[error("invalid backend {0:?}; expected local or hf")]
    InvalidBackend(String),
    #[error("{name} threshold must be within [0, 1], got {value}")]
    ThresholdOutOfRange { name: &'static str, value: f64 },
    #[error("concurrency must be > 0")]
    ZeroConcurrency,
    #[error("max chars must be > 0")]
    ZeroMaxChars,
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn resolve_api_key(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Result<Option<ApiKey>, ConfigError> {
    match cli_value {
        Some(v) => Ok(Some(ApiKey::new(v)?)),
        None => match env.var(env_key) {
            Some(v) => Ok(Some(ApiKey::new(v)?)),
            None => Ok(None),
        },
    }
}

pub fn resolve_string_with_default(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
    default: &str,
) -> String {
    match cli_value {
        Some(v) => v,
        None => env.var(env_key).unwrap_or_else(|| default.to_owned()),
    }
}

pub fn resolve_optional_string(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Option<String> {
    match cli_value {
        Some(v) => Some(v),
        None => env.var(env_key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hf_token_flag_beats_environment() {
        let env = MapEnv::default().with_var(ENV_HF_API_TOKEN, "hf_from_env");
        let from_flag = resolve_api_key(Some("hf_from_flag".to_owned()), ENV_HF_API_TOKEN, &env);
        assert_eq!(
            from_flag.ok().flatten().map(|k| k.expose().to_owned()),
            Some("hf_from_flag".to_owned())
        );
        let from_env = resolve_api_key(None, ENV_HF_API_TOKEN, &env);
        assert_eq!(
            from_env.ok().flatten().map(|k| k.expose().to_owned()),
            Some("hf_from_env".to_owned())
        );
        let blank = resolve_api_key(Some("  ".to_owned()), ENV_HF_API_TOKEN, &env);
        assert!(matches!(blank, Err(ConfigError::EmptyApiKey)));
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("hf_secret").expect("non-empty");
        assert!(!format!("{key:?}").contains("hf_secret"));
    }

    #[test]
    fn hf_endpoint_falls_back_to_default() {
        let env = MapEnv::default();
        let endpoint =
            resolve_string_with_default(None, ENV_HF_ENDPOINT, &env, DEFAULT_HF_ENDPOINT);
        assert_eq!(endpoint, DEFAULT_HF_ENDPOINT);
    }

    #[test]
    fn mode_requires_exact_match() {
        assert_eq!("text".parse::<Mode>(), Ok(Mode::Text));
        assert_eq!("audio".parse::<Mode>(), Ok(Mode::Audio));
        assert_eq!(
            "Text".parse::<Mode>(),
            Err(ConfigError::InvalidMode("Text".to_owned()))
        );
        assert!("video".parse::<Mode>().is_err());
    }

    #[test]
    fn run_config_without_mode_is_rejected() {
        let cfg: RunConfig =
            serde_json::from_str(r#"{"dataset": "datasets/text/reviews.csv"}"#).expect("parse");
        assert_eq!(cfg.mode(), Err(ConfigError::MissingMode));
        assert_eq!(cfg.dataset_name(), "reviews");
        assert!(!cfg.random);
        assert_eq!(cfg.limit, None);
    }

    #[test]
    fn run_config_full_entry_parses() {
        let cfg: RunConfig = serde_json::from_str(
            r#"{"dataset": "a/voices.csv", "mode": "audio", "limit": 3, "random": true}"#,
        )
        .expect("parse");
        assert_eq!(cfg.mode(), Ok(Mode::Audio));
        assert_eq!(cfg.limit, Some(3));
        assert!(cfg.random);
    }

    #[test]
    fn device_cli_value_wins() {
        let env = MapEnv::default().with_var(ENV_AFFECT_DEVICE, "cuda");
        let d = Device::resolve(Some("cpu".to_owned()), &env).expect("valid");
        assert_eq!(d, Device::Cpu);
    }

    #[test]
    fn device_env_used_when_cli_missing() {
        let env = MapEnv::default().with_var(ENV_AFFECT_DEVICE, "cuda");
        let d = Device::resolve(None, &env).expect("valid");
        assert_eq!(d, Device::Cuda);
    }

    #[test]
    fn device_rejects_unknown_value() {
        let env = MapEnv::default();
        assert!(Device::resolve(Some("tpu".to_owned()), &env).is_err());
    }

    #[test]
    fn probe_honours_cuda_visible_devices() {
        let env = MapEnv::default().with_var(ENV_CUDA_VISIBLE_DEVICES, "0");
        assert_eq!(Device::probe(&env), Device::Cuda);
    }

    #[test]
    fn thresholds_are_range_checked() {
        assert!(SentimentThresholds::new(0.3, 0.6).is_ok());
        assert!(SentimentThresholds::new(1.5, 0.6).is_err());
        assert!(SentimentThresholds::new(0.3, -0.1).is_err());
    }

    #[test]
    fn failure_policy_parses_short_names() {
        assert_eq!("skip".parse::<FailurePolicy>(), Ok(FailurePolicy::SkipAndLog));
        assert_eq!("fail".parse::<FailurePolicy>(), Ok(FailurePolicy::FailFast));
        assert!("retry".parse::<FailurePolicy>().is_err());
    }

    #[test]
    fn analysis_config_rejects_zero_concurrency() {
        assert_eq!(
            AnalysisConfig::default().with_concurrency(0),
            Err(ConfigError::ZeroConcurrency)
        );
    }
}
