//! Load-once shared scorer handle.
//!
//! The artifact is loaded at most once per handle, on first use. Concurrent
//! first callers block until that single load finishes. The outcome is cached
//! either way: a failed load keeps returning `ModelUnavailable` until the
//! process builds a new handle.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use pvguard_core::{PvError, Result};
use tracing::{error, info};

use super::artifact::ModelArtifact;
use super::Scorer;

pub type SharedScorer = Arc<dyn Scorer>;

type Loader = Box<dyn Fn() -> Result<SharedScorer> + Send + Sync>;

pub struct ScorerHandle {
    source: String,
    loader: Loader,
    cell: OnceLock<Result<SharedScorer>>,
}

impl ScorerHandle {
    /// Lazily load a trained artifact from `path`.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path: PathBuf = path.into();
        let source = path.display().to_string();
        Self::with_loader(source, move || load_artifact(&path))
    }

    /// Lazily build the scorer with an arbitrary loader.
    pub fn with_loader<F>(source: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> Result<SharedScorer> + Send + Sync + 'static,
    {
        Self {
            source: source.into(),
            loader: Box::new(loader),
            cell: OnceLock::new(),
        }
    }

    /// Wrap an already-built scorer.
    pub fn ready(scorer: SharedScorer) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(Ok(scorer));
        Self {
            source: "in-memory".to_string(),
            loader: Box::new(|| Err(PvError::ModelUnavailable("in-memory scorer has no loader".into()))),
            cell,
        }
    }

    /// The scorer, loading it on first call.
    pub fn get(&self) -> Result<SharedScorer> {
        self.cell.get_or_init(|| (self.loader)()).clone()
    }

    /// Whether a load has already succeeded. Never triggers a load.
    pub fn is_loaded(&self) -> bool {
        matches!(self.cell.get(), Some(Ok(_)))
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl std::fmt::Debug for ScorerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScorerHandle")
            .field("source", &self.source)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

fn load_artifact(path: &Path) -> Result<SharedScorer> {
    let start = std::time::Instant::now();
    match ModelArtifact::load(path) {
        Ok(artifact) => {
            info!(
                path = %path.display(),
                trees = artifact.model.trees.len(),
                max_samples = artifact.model.max_samples,
                trained_at = ?artifact.trained_at,
                "model artifact loaded in {:.1}ms",
                start.elapsed().as_secs_f64() * 1000.0
            );
            Ok(Arc::new(artifact.into_scorer()))
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "model artifact unavailable");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::stub::FixedScorer;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn loads_once_across_threads() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let handle = Arc::new(ScorerHandle::with_loader("counting", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(20));
            Ok(Arc::new(FixedScorer::normal(0.1)) as SharedScorer)
        }));

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let h = handle.clone();
                std::thread::spawn(move || h.get().is_ok())
            })
            .collect();
        for t in threads {
            assert!(t.join().unwrap());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(handle.is_loaded());
    }

    #[test]
    fn failure_is_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let handle = ScorerHandle::with_loader("broken", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(PvError::ModelUnavailable("corrupt".into()))
        });
        assert!(handle.get().is_err());
        assert!(handle.get().is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!handle.is_loaded());
    }

    #[test]
    fn missing_path_reports_model_unavailable() {
        let handle = ScorerHandle::from_path("/nonexistent/pvguard/model.json");
        assert!(!handle.is_loaded());
        assert!(matches!(handle.get(), Err(PvError::ModelUnavailable(_))));
    }

    #[test]
    fn ready_handle_is_loaded() {
        let handle = ScorerHandle::ready(Arc::new(FixedScorer::anomalous(-0.3)));
        assert!(handle.is_loaded());
        assert!(handle.get().is_ok());
    }
}
