//! Offline model fitting: telemetry history in, artifact out.
//!
//! Uses the same [`FeatureVector::derive`] as inference so training and
//! serving can never disagree on feature order or nominal power.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::Utc;
use pvguard_core::config::TrainingConfig;
use pvguard_core::{PvError, RawSample};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::features::{FeatureVector, FEATURE_COUNT};
use crate::scorer::isolation_forest::{ForestParams, IsolationForest};
use crate::scorer::{ModelArtifact, StandardScaler};

#[derive(Error, Debug)]
pub enum TrainingError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: malformed record: {source}")]
    Parse {
        line: usize,
        #[source]
        source: csv::Error,
    },

    #[error("line {line}: {source}")]
    Timestamp {
        line: usize,
        #[source]
        source: PvError,
    },

    #[error("no usable samples after cleaning ({raw} read)")]
    EmptyDataset { raw: usize },

    #[error("invalid training parameter: {0}")]
    InvalidParams(String),

    #[error("fitted model is not loadable: {0}")]
    InvalidModel(String),
}

/// One telemetry row as exported by the data logger.
///
/// Logger headers (`Date Time`, `Temperature(oC)`, ...) and snake_case
/// headers are both accepted. Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct TrainingRecord {
    #[serde(rename = "Date Time", alias = "timestamp")]
    timestamp: String,
    #[serde(rename = "Temperature(oC)", alias = "temperature", alias = "temperature_c")]
    temperature: f64,
    #[serde(rename = "Humidity(%)", alias = "humidity", alias = "humidity_pct")]
    humidity: f64,
    #[serde(rename = "Power(mW)", alias = "power_mW", alias = "power_mw")]
    power_mw: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingParams {
    pub n_estimators: usize,
    pub contamination: f64,
    pub max_samples: usize,
    pub seed: u64,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self::from(&TrainingConfig::default())
    }
}

impl From<&TrainingConfig> for TrainingParams {
    fn from(cfg: &TrainingConfig) -> Self {
        Self {
            n_estimators: cfg.n_estimators,
            contamination: cfg.contamination,
            max_samples: cfg.max_samples,
            seed: cfg.seed,
        }
    }
}

impl TrainingParams {
    pub fn validate(&self) -> Result<(), TrainingError> {
        if self.n_estimators == 0 {
            return Err(TrainingError::InvalidParams("n_estimators must be at least 1".into()));
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(TrainingError::InvalidParams(format!(
                "contamination must be in (0, 0.5], got {}",
                self.contamination
            )));
        }
        if self.max_samples < 2 {
            return Err(TrainingError::InvalidParams("max_samples must be at least 2".into()));
        }
        Ok(())
    }
}

/// Outcome of a training run.
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub raw_samples: usize,
    pub clean_samples: usize,
    pub trees: usize,
    pub offset: f64,
    pub output: PathBuf,
}

/// Read CSV telemetry with a header row. Empty lines are skipped.
pub fn load_samples(path: &Path) -> Result<Vec<RawSample>, TrainingError> {
    let file = File::open(path).map_err(|source| TrainingError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut samples = Vec::new();
    for (idx, row) in reader.deserialize::<TrainingRecord>().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record = row.map_err(|source| TrainingError::Parse { line, source })?;
        let sample = RawSample::parse(
            &record.timestamp,
            record.temperature,
            record.humidity,
            record.power_mw,
        )
        .map_err(|source| TrainingError::Timestamp { line, source })?;
        samples.push(sample);
    }
    Ok(samples)
}

/// Drop physically implausible rows and order the rest by time.
pub fn clean(samples: Vec<RawSample>) -> Vec<RawSample> {
    let mut kept: Vec<RawSample> = samples
        .into_iter()
        .filter(|s| {
            s.temperature_c > 0.0
                && s.humidity_pct > 0.0
                && s.humidity_pct <= 100.0
                && s.power_mw.is_finite()
                && s.temperature_c.is_finite()
        })
        .collect();
    kept.sort_by_key(|s| s.timestamp);
    kept
}

/// Fit scaler + isolation forest on cleaned samples.
pub fn fit(samples: &[RawSample], params: &TrainingParams) -> Result<ModelArtifact, TrainingError> {
    params.validate()?;
    if samples.is_empty() {
        return Err(TrainingError::EmptyDataset { raw: 0 });
    }

    let rows: Vec<[f64; FEATURE_COUNT]> = samples
        .iter()
        .map(|s| FeatureVector::derive(s).to_array())
        .collect();

    let scaler = StandardScaler::fit(&rows);
    scaler.validate().map_err(TrainingError::InvalidModel)?;
    let scaled: Vec<[f64; FEATURE_COUNT]> = rows.iter().map(|r| scaler.transform(r)).collect();

    let mut rng = StdRng::seed_from_u64(params.seed);
    let forest = IsolationForest::fit(
        &scaled,
        &ForestParams {
            n_estimators: params.n_estimators,
            max_samples: params.max_samples,
            contamination: params.contamination,
        },
        &mut rng,
    );

    let mut artifact = ModelArtifact::new(scaler, forest);
    artifact.trained_at = Some(Utc::now());
    artifact.n_training_samples = samples.len();
    artifact.contamination = params.contamination;

    // Never write what the scorer would refuse to load.
    artifact
        .validate()
        .map_err(|e| TrainingError::InvalidModel(e.to_string()))?;
    Ok(artifact)
}

/// Full offline run: load, clean, fit, write the artifact.
pub fn train_from_file(
    data_path: &Path,
    output: &Path,
    params: &TrainingParams,
) -> Result<TrainingSummary, TrainingError> {
    params.validate()?;

    let raw = load_samples(data_path)?;
    let raw_count = raw.len();
    info!(path = %data_path.display(), rows = raw_count, "loaded training data");

    let cleaned = clean(raw);
    if cleaned.is_empty() {
        return Err(TrainingError::EmptyDataset { raw: raw_count });
    }
    info!(
        kept = cleaned.len(),
        dropped = raw_count - cleaned.len(),
        "cleaned training data"
    );

    let start = std::time::Instant::now();
    let artifact = fit(&cleaned, params)?;
    info!(
        trees = artifact.model.trees.len(),
        max_samples = artifact.model.max_samples,
        offset = artifact.model.offset,
        "model fitted in {:.1}s",
        start.elapsed().as_secs_f64()
    );

    artifact.save(output).map_err(|source| TrainingError::Io {
        path: output.to_path_buf(),
        source,
    })?;
    info!(path = %output.display(), "model artifact written");

    Ok(TrainingSummary {
        raw_samples: raw_count,
        clean_samples: cleaned.len(),
        trees: artifact.model.trees.len(),
        offset: artifact.model.offset,
        output: output.to_path_buf(),
    })
}
