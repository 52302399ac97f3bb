//! On-disk model artifact: feature list, fitted scaler, fitted forest.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use pvguard_core::{PvError, Result};
use serde::{Deserialize, Serialize};

use super::isolation_forest::IsolationForest;
use super::scaler::StandardScaler;
use super::{Label, Scorer, ScorerResult};
use crate::features::{FeatureVector, FEATURE_NAMES};

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    /// Feature order the model was fitted with.
    pub features: Vec<String>,
    pub scaler: StandardScaler,
    pub model: IsolationForest,
    #[serde(default)]
    pub trained_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub n_training_samples: usize,
    #[serde(default)]
    pub contamination: f64,
}

impl ModelArtifact {
    pub fn new(scaler: StandardScaler, model: IsolationForest) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            features: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            scaler,
            model,
            trained_at: None,
            n_training_samples: 0,
            contamination: 0.0,
        }
    }

    /// Read and validate an artifact. Every failure is `ModelUnavailable`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            PvError::ModelUnavailable(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
            .map_err(|e| PvError::ModelUnavailable(format!("{}: {}", path.display(), unwrap_message(e))))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let artifact: Self = serde_json::from_str(raw)
            .map_err(|e| PvError::ModelUnavailable(format!("malformed artifact: {}", e)))?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Write the artifact, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = self.to_json().map_err(std::io::Error::other)?;
        fs::write(path, json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(PvError::ModelUnavailable(format!(
                "unsupported artifact format version {} (expected {})",
                self.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }
        if self.features.iter().map(String::as_str).ne(FEATURE_NAMES.iter().copied()) {
            return Err(PvError::ModelUnavailable(format!(
                "feature list {:?} does not match engine order {:?}",
                self.features, FEATURE_NAMES
            )));
        }
        self.scaler.validate().map_err(PvError::ModelUnavailable)?;
        self.model.validate().map_err(PvError::ModelUnavailable)?;
        Ok(())
    }

    pub fn into_scorer(self) -> TrainedScorer {
        TrainedScorer {
            scaler: self.scaler,
            forest: self.model,
        }
    }
}

fn unwrap_message(e: PvError) -> String {
    match e {
        PvError::ModelUnavailable(msg) | PvError::InvalidTimestamp(msg) => msg,
    }
}

/// Scaling followed by isolation-forest scoring.
#[derive(Debug, Clone)]
pub struct TrainedScorer {
    scaler: StandardScaler,
    forest: IsolationForest,
}

impl TrainedScorer {
    fn scaled(&self, features: &FeatureVector) -> [f64; crate::features::FEATURE_COUNT] {
        self.scaler.transform(&features.to_array())
    }
}

impl Scorer for TrainedScorer {
    fn predict(&self, features: &FeatureVector) -> Label {
        self.forest.predict(&self.scaled(features))
    }

    fn decision_function(&self, features: &FeatureVector) -> f64 {
        self.forest.decision_function(&self.scaled(features))
    }

    fn score(&self, features: &FeatureVector) -> ScorerResult {
        let score = self.forest.decision_function(&self.scaled(features));
        ScorerResult {
            label: Label::from_decision(score),
            score,
        }
    }
}
