//! PV telemetry anomaly decision engine.
//!
//! - [`features`]: raw sample → fixed-order feature vector
//! - [`rules`]: ordered physical/temporal plausibility rules
//! - [`scorer`]: trained outlier model behind the [`scorer::Scorer`] capability
//! - [`fusion`]: model + rules → verdict, score, explanation
//! - [`engine`]: per-request orchestration
//! - [`training`]: offline fitting of the scorer artifact

pub mod engine;
pub mod features;
pub mod fusion;
pub mod rules;
pub mod scorer;
pub mod training;

pub use engine::{DecisionEngine, DecisionTrace};
pub use features::{FeatureVector, FEATURE_NAMES, PANEL_NOMINAL_POWER_W};
pub use fusion::{FusionPolicy, MODEL_SCORE_THRESHOLD};
pub use rules::{RuleEngine, RuleVerdict};
pub use scorer::{FixedScorer, Label, Scorer, ScorerHandle, ScorerResult};
