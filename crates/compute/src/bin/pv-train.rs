//! pv-train: fit the scorer artifact from historical telemetry.
//!
//! Reads CSV telemetry exported by the data logger, applies the training-time
//! cleaning filter, fits standard scaling + an isolation forest, and writes
//! the artifact the server loads at `MODEL_PATH`.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use pvguard_compute::training::{train_from_file, TrainingParams};

// ── CLI ─────────────────────────────────────────────────────────────

/// Train the PV anomaly scorer. Unset flags fall back to the environment config.
#[derive(Parser, Debug)]
#[command(name = "pv-train", version, about)]
struct Cli {
    /// CSV telemetry file with a header row.
    #[arg(long)]
    data: Option<PathBuf>,

    /// Artifact output path.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Number of isolation trees.
    #[arg(long)]
    n_estimators: Option<usize>,

    /// Expected fraction of anomalies in the training data.
    #[arg(long)]
    contamination: Option<f64>,

    /// Per-tree subsample cap.
    #[arg(long)]
    max_samples: Option<usize>,

    /// RNG seed.
    #[arg(long)]
    seed: Option<u64>,
}

// ── main ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    pvguard_core::config::load_dotenv();
    let config = pvguard_core::Config::from_env();

    let defaults = TrainingParams::from(&config.training);
    let params = TrainingParams {
        n_estimators: cli.n_estimators.unwrap_or(defaults.n_estimators),
        contamination: cli.contamination.unwrap_or(defaults.contamination),
        max_samples: cli.max_samples.unwrap_or(defaults.max_samples),
        seed: cli.seed.unwrap_or(defaults.seed),
    };
    let data = cli.data.unwrap_or(config.training.data_path);
    let output = cli.output.unwrap_or(config.model.path);

    info!(
        data = %data.display(),
        output = %output.display(),
        n_estimators = params.n_estimators,
        contamination = params.contamination,
        max_samples = params.max_samples,
        seed = params.seed,
        "pv-train starting"
    );

    let summary = train_from_file(&data, &output, &params)?;

    info!(
        "Model trained on {}/{} samples ({} trees, offset {:.4}) and saved to {}",
        summary.clean_samples,
        summary.raw_samples,
        summary.trees,
        summary.offset,
        summary.output.display()
    );
    Ok(())
}
