//! Scorer adapter: the trained outlier model behind a narrow capability.
//!
//! The decision engine only sees [`Scorer`]. Two implementations exist:
//! - [`TrainedScorer`]: standard scaling + isolation forest loaded from an artifact
//! - [`FixedScorer`]: deterministic stub for tests and dry runs
//!
//! Sub-modules:
//! - [`scaler`]: per-feature standardization
//! - [`isolation_forest`]: tree ensemble scoring and fitting
//! - [`artifact`]: on-disk model format and load-time validation
//! - [`handle`]: load-once shared handle

pub mod artifact;
pub mod handle;
pub mod isolation_forest;
pub mod scaler;
pub mod stub;

use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;

pub use artifact::{ModelArtifact, TrainedScorer, ARTIFACT_FORMAT_VERSION};
pub use handle::{ScorerHandle, SharedScorer};
pub use isolation_forest::{IsolationForest, IsolationTree, TreeNode};
pub use scaler::StandardScaler;
pub use stub::FixedScorer;

/// Raw model label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Normal,
    Anomalous,
}

impl Label {
    /// Map the conventional `+1` / `-1` prediction to a label.
    pub fn from_prediction(prediction: i8) -> Self {
        if prediction < 0 {
            Label::Anomalous
        } else {
            Label::Normal
        }
    }

    /// Negative decision values are outliers.
    pub fn from_decision(decision: f64) -> Self {
        if decision < 0.0 {
            Label::Anomalous
        } else {
            Label::Normal
        }
    }

    pub fn as_prediction(self) -> i8 {
        match self {
            Label::Normal => 1,
            Label::Anomalous => -1,
        }
    }
}

/// Label plus continuous score. Lower score = more anomalous.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScorerResult {
    pub label: Label,
    pub score: f64,
}

/// Opaque outlier model: feature vector in, label and score out.
pub trait Scorer: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Label;

    /// Signed distance to the decision boundary; negative means outlier.
    fn decision_function(&self, features: &FeatureVector) -> f64;

    fn score(&self, features: &FeatureVector) -> ScorerResult {
        ScorerResult {
            label: self.predict(features),
            score: self.decision_function(features),
        }
    }
}
