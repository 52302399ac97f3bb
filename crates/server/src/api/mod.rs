//! HTTP endpoint modules.
//!
//! Shared response types live here in mod.rs.

pub mod doc;
mod health;
mod predict;

use pvguard_core::{ErrorKind, PvError};
use serde::Serialize;

// ── Shared types ─────────────────────────────────────────────────

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// `invalid_timestamp` or `model_unavailable`.
    #[schema(value_type = String, example = "invalid_timestamp")]
    pub kind: ErrorKind,
}

impl From<&PvError> for ErrorResponse {
    fn from(err: &PvError) -> Self {
        Self {
            error: err.to_string(),
            kind: err.kind(),
        }
    }
}

// ── Re-exports ───────────────────────────────────────────────────

pub use health::{health, root};
pub use predict::predict;
