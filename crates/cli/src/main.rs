#![deny(warnings)]

use affect_core::batch::{BatchRunner, BatchSettings};
use affect_core::config::{
    resolve_api_key, resolve_optional_string, resolve_string_with_default, AnalysisConfig,
    Backend, Device, Env, FailurePolicy, HfConfig, RunConfig, SentimentThresholds, StdEnv,
    DEFAULT_AUDIO_ROOT, DEFAULT_HF_ENDPOINT, DEFAULT_MAX_CHARS, DEFAULT_POLARITY_THRESHOLD,
    DEFAULT_RESULTS_DIR, DEFAULT_SUBJECTIVITY_THRESHOLD, DEFAULT_TEXT_COLUMN,
    DEFAULT_WHISPER_MODEL, ENV_HF_API_TOKEN, ENV_HF_ENDPOINT, ENV_LANGUAGETOOL_URL,
};
use affect_core::models::ModelSettings;
use affect_core::report::render_results;
use affect_core::results::load_jsons;
use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "affect")]
#[command(about = "Emotion, sentiment and statement-type analysis of text and voice datasets")]
struct Cli {
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the configurations found in JSON files or directories.
    Run(RunArgs),
    /// Print tables for previously saved result files or directories.
    Load {
        #[arg(required = true)]
        results: Vec<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    #[arg(required = true)]
    configs: Vec<PathBuf>,

    /// cpu, cuda or auto.
    #[arg(long)]
    device: Option<String>,

    /// local (offline models and whisper.cpp) or hf (Hugging Face Inference API).
    #[arg(long, default_value = "local")]
    backend: String,

    /// What to do when one item fails: skip or fail.
    #[arg(long, default_value = "skip")]
    on_error: String,

    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    #[arg(long, default_value_t = DEFAULT_MAX_CHARS)]
    max_chars: usize,

    #[arg(long, default_value_t = DEFAULT_POLARITY_THRESHOLD)]
    polarity_threshold: f64,

    #[arg(long, default_value_t = DEFAULT_SUBJECTIVITY_THRESHOLD)]
    subjectivity_threshold: f64,

    #[arg(long, default_value = DEFAULT_RESULTS_DIR)]
    results_dir: PathBuf,

    #[arg(long, default_value = DEFAULT_AUDIO_ROOT)]
    audio_root: PathBuf,

    #[arg(long, default_value = DEFAULT_TEXT_COLUMN)]
    text_column: String,

    #[arg(long, default_value = DEFAULT_WHISPER_MODEL)]
    whisper_model: PathBuf,

    #[arg(long)]
    hf_token: Option<String>,

    #[arg(long)]
    hf_endpoint: Option<String>,

    /// LanguageTool server for grammar correction; offline rules when unset.
    #[arg(long)]
    languagetool_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    match cli.command {
        Command::Run(args) => run_command(args, &StdEnv).await,
        Command::Load { results } => load_command(&results),
    }
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn build_runner(args: &RunArgs, env: &impl Env) -> anyhow::Result<BatchRunner> {
    let device = Device::resolve(args.device.clone(), env)?;
    let backend: Backend = args.backend.parse()?;
    let failure_policy: FailurePolicy = args.on_error.parse()?;
    let thresholds =
        SentimentThresholds::new(args.polarity_threshold, args.subjectivity_threshold)?;

    let analysis = AnalysisConfig {
        thresholds,
        failure_policy,
        device,
        ..AnalysisConfig::default()
    }
    .with_concurrency(args.concurrency)?
    .with_max_chars(args.max_chars)?;

    let hf = HfConfig {
        endpoint: resolve_string_with_default(
            args.hf_endpoint.clone(),
            ENV_HF_ENDPOINT,
            env,
            DEFAULT_HF_ENDPOINT,
        ),
        api_token: resolve_api_key(args.hf_token.clone(), ENV_HF_API_TOKEN, env)?,
    };
    let models = ModelSettings {
        backend,
        device,
        hf,
        languagetool_url: resolve_optional_string(
            args.languagetool_url.clone(),
            ENV_LANGUAGETOOL_URL,
            env,
        ),
        whisper_model: args.whisper_model.clone(),
    };
    let settings = BatchSettings {
        results_dir: args.results_dir.clone(),
        audio_root: args.audio_root.clone(),
        text_column: args.text_column.clone(),
    };

    tracing::info!(
        device = %device,
        backend = ?backend,
        on_error = ?failure_policy,
        concurrency = analysis.concurrency,
        "config loaded"
    );
    Ok(BatchRunner::new(models, analysis, settings))
}

async fn run_command(args: RunArgs, env: &impl Env) -> anyhow::Result<()> {
    let groups =
        load_jsons::<RunConfig>(&args.configs).context("failed to load configurations")?;
    if groups.is_empty() {
        anyhow::bail!("no valid configuration files found");
    }
    let runner = build_runner(&args, env)?;

    let total = groups.len();
    for (i, (name, configs)) in groups.iter().enumerate() {
        tracing::info!(
            file = i + 1,
            total,
            name = %name,
            configurations = configs.len(),
            "running configuration file"
        );
        for outcome in runner.run_group(name, configs).await {
            if !outcome.report.is_empty() {
                println!("{}", outcome.report);
            }
        }
    }
    tracing::info!("all groups completed");
    Ok(())
}

fn load_command(paths: &[PathBuf]) -> anyhow::Result<()> {
    let files = load_jsons::<Value>(paths).context("failed to load result files")?;
    if files.is_empty() {
        anyhow::bail!("no valid results files found");
    }
    let total = files.len();
    for (i, (name, results)) in files.iter().enumerate() {
        tracing::info!(
            file = i + 1,
            total,
            name = %name,
            records = results.len(),
            "results file loaded"
        );
        println!("{}", render_results(results));
    }
    Ok(())
}
