//! CLI argument parsing and subcommand dispatch.

use clap::{Parser, Subcommand};

use pvguard_compute::DecisionEngine;
use pvguard_core::{Config, RawSample};

#[derive(Parser, Debug)]
#[command(name = "pvguard-server", version, about = "PV panel anomaly decision service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server (default).
    Serve,

    /// Decide a single reading and print the result as JSON.
    Predict {
        /// Local wall-clock time, e.g. "2024-12-01 12:00:00".
        #[arg(long)]
        timestamp: String,

        /// Panel temperature in °C.
        #[arg(long, allow_hyphen_values = true)]
        temperature: f64,

        /// Relative humidity in percent.
        #[arg(long, allow_hyphen_values = true)]
        humidity: f64,

        /// Panel output in milliwatts.
        #[arg(long = "power-mw", allow_hyphen_values = true)]
        power_mw: f64,

        /// Print every intermediate (features, scorer output, rule verdicts).
        #[arg(long)]
        explain: bool,
    },
}

/// Run a one-shot prediction against the configured artifact.
pub fn predict(
    config: &Config,
    timestamp: &str,
    temperature: f64,
    humidity: f64,
    power_mw: f64,
    explain: bool,
) -> anyhow::Result<()> {
    let engine = DecisionEngine::from_config(&config.model);
    let sample = RawSample::parse(timestamp, temperature, humidity, power_mw)?;

    let json = if explain {
        serde_json::to_string_pretty(&engine.trace(&sample)?)?
    } else {
        serde_json::to_string_pretty(&engine.evaluate(&sample)?)?
    };
    println!("{}", json);
    Ok(())
}
