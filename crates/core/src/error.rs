use serde::Serialize;
use thiserror::Error;

/// Request-path failures of the decision engine.
///
/// Out-of-range readings (negative temperature, humidity above 100%, ...) are
/// not errors: they flow through the rule layer as anomaly signals.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PvError {
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
}

/// Coarse error classification for transports that map failures to status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidTimestamp,
    ModelUnavailable,
}

impl PvError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PvError::InvalidTimestamp(_) => ErrorKind::InvalidTimestamp,
            PvError::ModelUnavailable(_) => ErrorKind::ModelUnavailable,
        }
    }
}

pub type Result<T> = std::result::Result<T, PvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(
            PvError::InvalidTimestamp("x".into()).kind(),
            ErrorKind::InvalidTimestamp
        );
        assert_eq!(
            PvError::ModelUnavailable("x".into()).kind(),
            ErrorKind::ModelUnavailable
        );
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::ModelUnavailable).unwrap();
        assert_eq!(json, "\"model_unavailable\"");
    }
}
