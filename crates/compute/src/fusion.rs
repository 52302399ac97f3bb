//! Fusion of the model signal and the rule layer into one decision.
//!
//! - Model contributes only when its label is anomalous *and* its score is
//!   strictly below the threshold.
//! - Verdict is model OR rules; either side alone is enough.
//! - Explanation lists triggered rule reasons in rule order, then the model
//!   reason if the model contributed. Nothing triggered means "Normal operation."
//! - The returned score is the raw scorer score; rules never touch it.

use pvguard_core::config::DEFAULT_MODEL_SCORE_THRESHOLD;
use pvguard_core::DecisionResult;

use crate::rules::RuleVerdict;
use crate::scorer::{Label, ScorerResult};

pub const MODEL_SCORE_THRESHOLD: f64 = DEFAULT_MODEL_SCORE_THRESHOLD;
pub const MODEL_REASON: &str = "Model detected abnormal behavior pattern.";
pub const NORMAL_REASON: &str = "Normal operation.";
pub const REASON_SEPARATOR: &str = " | ";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionPolicy {
    pub score_threshold: f64,
}

impl Default for FusionPolicy {
    fn default() -> Self {
        Self {
            score_threshold: MODEL_SCORE_THRESHOLD,
        }
    }
}

impl FusionPolicy {
    pub fn new(score_threshold: f64) -> Self {
        Self { score_threshold }
    }

    pub fn is_model_anomaly(&self, scorer: &ScorerResult) -> bool {
        scorer.label == Label::Anomalous && scorer.score < self.score_threshold
    }

    pub fn fuse(&self, scorer: &ScorerResult, verdicts: &[RuleVerdict]) -> DecisionResult {
        let model_anomaly = self.is_model_anomaly(scorer);

        let mut reasons: Vec<&str> = Vec::with_capacity(verdicts.len() + 1);
        for verdict in verdicts.iter().filter(|v| v.triggered) {
            push_unique(&mut reasons, verdict.reason);
        }
        let rule_anomaly = !reasons.is_empty();

        if model_anomaly {
            push_unique(&mut reasons, MODEL_REASON);
        }
        if reasons.is_empty() {
            reasons.push(NORMAL_REASON);
        }

        DecisionResult {
            is_anomaly: model_anomaly || rule_anomaly,
            anomaly_score: scorer.score,
            reason: reasons.join(REASON_SEPARATOR),
        }
    }
}

fn push_unique<'a>(reasons: &mut Vec<&'a str>, reason: &'a str) {
    if !reasons.contains(&reason) {
        reasons.push(reason);
    }
}
