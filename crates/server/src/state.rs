use pvguard_compute::DecisionEngine;
use pvguard_core::Config;

/// Shared application state passed to every handler via `State<Arc<AppState>>`.
#[derive(Debug)]
pub struct AppState {
    pub engine: DecisionEngine,
}

impl AppState {
    pub fn new(engine: DecisionEngine) -> Self {
        Self { engine }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(DecisionEngine::from_config(&config.model))
    }
}
