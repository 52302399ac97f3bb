use pvguard_core::config::ModelConfig;
use pvguard_core::{DecisionResult, RawSample, Result};
use serde::Serialize;
use tracing::debug;

use crate::features::FeatureVector;
use crate::fusion::FusionPolicy;
use crate::rules::{RuleEngine, RuleVerdict};
use crate::scorer::{ScorerHandle, ScorerResult};

/// Every intermediate of one decision, for audit output.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionTrace {
    pub features: FeatureVector,
    pub scorer: ScorerResult,
    pub model_anomaly: bool,
    pub rules: Vec<RuleVerdict>,
    pub decision: DecisionResult,
}

/// Per-sample anomaly decision: derive features once, score, apply rules, fuse.
#[derive(Debug)]
pub struct DecisionEngine {
    scorer: ScorerHandle,
    rules: RuleEngine,
    policy: FusionPolicy,
}

impl DecisionEngine {
    pub fn new(scorer: ScorerHandle, policy: FusionPolicy) -> Self {
        Self {
            scorer,
            rules: RuleEngine::default(),
            policy,
        }
    }

    /// Engine over the configured artifact path, loaded on first use.
    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(
            ScorerHandle::from_path(&config.path),
            FusionPolicy::new(config.score_threshold),
        )
    }

    pub fn with_rules(mut self, rules: RuleEngine) -> Self {
        self.rules = rules;
        self
    }

    pub fn scorer(&self) -> &ScorerHandle {
        &self.scorer
    }

    pub fn policy(&self) -> &FusionPolicy {
        &self.policy
    }

    /// Force the one-time model load.
    pub fn warm_up(&self) -> Result<()> {
        self.scorer.get().map(|_| ())
    }

    pub fn evaluate(&self, sample: &RawSample) -> Result<DecisionResult> {
        self.trace(sample).map(|t| t.decision)
    }

    pub fn trace(&self, sample: &RawSample) -> Result<DecisionTrace> {
        let features = FeatureVector::derive(sample);
        let scorer = self.scorer.get()?.score(&features);
        let rules = self.rules.evaluate(sample, features.relative_power);
        let decision = self.policy.fuse(&scorer, &rules);

        debug!(
            timestamp = %sample.timestamp,
            score = scorer.score,
            label = ?scorer.label,
            is_anomaly = decision.is_anomaly,
            reason = %decision.reason,
            "decision"
        );

        Ok(DecisionTrace {
            features,
            model_anomaly: self.policy.is_model_anomaly(&scorer),
            scorer,
            rules,
            decision,
        })
    }

    /// Transport-facing entry point: raw request fields in, decision out.
    pub fn predict_anomaly(
        &self,
        timestamp: &str,
        temperature_c: f64,
        humidity_pct: f64,
        power_mw: f64,
    ) -> Result<DecisionResult> {
        let sample = RawSample::parse(timestamp, temperature_c, humidity_pct, power_mw)?;
        self.evaluate(&sample)
    }
}
