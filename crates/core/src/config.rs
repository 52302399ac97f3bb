use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default fusion gate on the scorer's decision function.
pub const DEFAULT_MODEL_SCORE_THRESHOLD: f64 = -0.05;

/// Raw telemetry export read by `pv-train`.
pub const DEFAULT_TRAIN_DATA_PATH: &str = "data/raw/pv_telemetry.csv";

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub training: TrainingConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `PVGUARD_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("PVGUARD_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            model: ModelConfig::from_env_profiled(p),
            training: TrainingConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:   {}:{} (cors={})", self.server.host, self.server.port, self.server.cors_origin);
        tracing::info!(
            "  model:    path={}, threshold={}, preload={}",
            self.model.path.display(),
            self.model.score_threshold,
            self.model.preload
        );
        tracing::info!(
            "  training: data={}, trees={}, contamination={}, max_samples={}, seed={}",
            self.training.data_path.display(),
            self.training.n_estimators,
            self.training.contamination,
            self.training.max_samples,
            self.training.seed
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_parse(p, "PORT", 8000),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", "*"),
        }
    }
}

// ── Trained model ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub path: PathBuf,
    /// Scores strictly below this gate a model-reported anomaly into the verdict.
    pub score_threshold: f64,
    /// Load the artifact at startup instead of on the first request.
    pub preload: bool,
}

impl ModelConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            path: PathBuf::from(profiled_env_or(p, "MODEL_PATH", "models/isolation_forest.json")),
            score_threshold: score_threshold(p),
            preload: profiled_env_bool(p, "MODEL_PRELOAD", true),
        }
    }
}

/// A non-finite threshold would silently disable the model signal.
fn score_threshold(p: &str) -> f64 {
    let threshold = profiled_env_parse(p, "MODEL_SCORE_THRESHOLD", DEFAULT_MODEL_SCORE_THRESHOLD);
    if threshold.is_finite() {
        threshold
    } else {
        tracing::warn!(
            "MODEL_SCORE_THRESHOLD={} is not finite, using {}",
            threshold,
            DEFAULT_MODEL_SCORE_THRESHOLD
        );
        DEFAULT_MODEL_SCORE_THRESHOLD
    }
}

// ── Offline training ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub data_path: PathBuf,
    pub n_estimators: usize,
    pub contamination: f64,
    pub max_samples: usize,
    pub seed: u64,
}

impl TrainingConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            data_path: PathBuf::from(profiled_env_or(p, "TRAIN_DATA_PATH", DEFAULT_TRAIN_DATA_PATH)),
            n_estimators: profiled_env_parse(p, "TRAIN_N_ESTIMATORS", 200),
            contamination: profiled_env_parse(p, "TRAIN_CONTAMINATION", 0.01),
            max_samples: profiled_env_parse(p, "TRAIN_MAX_SAMPLES", 256),
            seed: profiled_env_parse(p, "TRAIN_SEED", 42),
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_TRAIN_DATA_PATH),
            n_estimators: 200,
            contamination: 0.01,
            max_samples: 256,
            seed: 42,
        }
    }
}
