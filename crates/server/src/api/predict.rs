//! Single-reading anomaly decision endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pvguard_core::{DecisionResult, PvError};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::state::AppState;

use super::ErrorResponse;

/// One telemetry reading as posted by the collector.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct Measurement {
    /// Local wall-clock time, e.g. `2024-12-01 12:00:00`.
    #[schema(example = "2024-12-01 12:00:00")]
    pub timestamp: String,
    /// Panel temperature in °C.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Panel output in milliwatts.
    #[serde(rename = "power_mW")]
    pub power_mw: f64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AnomalyResponse {
    pub is_anomaly: bool,
    /// Raw scorer decision value. Lower is more anomalous.
    pub anomaly_score: f64,
    pub reason: String,
}

impl From<DecisionResult> for AnomalyResponse {
    fn from(d: DecisionResult) -> Self {
        Self {
            is_anomaly: d.is_anomaly,
            anomaly_score: d.anomaly_score,
            reason: d.reason,
        }
    }
}

fn map_error(err: PvError) -> Response {
    let status = match &err {
        PvError::InvalidTimestamp(_) => {
            warn!("rejected reading: {}", err);
            StatusCode::UNPROCESSABLE_ENTITY
        }
        PvError::ModelUnavailable(_) => {
            error!("prediction failed: {}", err);
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    (status, Json(ErrorResponse::from(&err))).into_response()
}

/// Classify one reading as normal or anomalous, with an explanation.
#[utoipa::path(
    post,
    path = "/predict",
    tag = "Prediction",
    request_body = Measurement,
    responses(
        (status = 200, description = "Fused decision", body = AnomalyResponse),
        (status = 422, description = "Timestamp could not be parsed", body = ErrorResponse),
        (status = 503, description = "Scorer artifact unavailable", body = ErrorResponse)
    )
)]
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(m): Json<Measurement>,
) -> Result<Json<AnomalyResponse>, Response> {
    // First call may load the artifact from disk.
    let outcome = tokio::task::spawn_blocking(move || {
        state
            .engine
            .predict_anomaly(&m.timestamp, m.temperature, m.humidity, m.power_mw)
    })
    .await
    .map_err(|e| {
        error!("prediction task failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    })?;

    outcome.map(|d| Json(d.into())).map_err(map_error)
}
