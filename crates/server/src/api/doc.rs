//! OpenAPI documentation aggregator.
//!
//! Collects the `#[utoipa::path]` handlers and `ToSchema` types into one
//! OpenAPI document, served via Scalar UI at `/docs`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "pvguard API",
        version = "0.1.0",
        description = "Anomaly decisions for single PV panel telemetry readings.",
    ),
    tags(
        (name = "Health", description = "Service banner and model readiness"),
        (name = "Prediction", description = "Fused model and rule anomaly decisions"),
    ),
    paths(
        crate::api::health::root,
        crate::api::health::health,
        crate::api::predict::predict,
    ),
    components(schemas(
        crate::api::ErrorResponse,
        crate::api::health::RootResponse,
        crate::api::health::HealthResponse,
        crate::api::predict::Measurement,
        crate::api::predict::AnomalyResponse,
    ))
)]
pub struct ApiDoc;
