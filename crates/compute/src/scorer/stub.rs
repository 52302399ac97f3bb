use super::{Label, Scorer, ScorerResult};
use crate::features::FeatureVector;

/// Deterministic scorer that ignores its input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedScorer {
    result: ScorerResult,
}

impl FixedScorer {
    pub fn new(label: Label, score: f64) -> Self {
        Self {
            result: ScorerResult { label, score },
        }
    }

    pub fn normal(score: f64) -> Self {
        Self::new(Label::Normal, score)
    }

    pub fn anomalous(score: f64) -> Self {
        Self::new(Label::Anomalous, score)
    }
}

impl Scorer for FixedScorer {
    fn predict(&self, _features: &FeatureVector) -> Label {
        self.result.label
    }

    fn decision_function(&self, _features: &FeatureVector) -> f64 {
        self.result.score
    }
}
