use crate::infra::{AppState, Services};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use farmcert::workflows::certificate::certificate_router;
use farmcert::workflows::inspection::inspection_router;
use farmcert::workflows::records::record_router;
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

pub(crate) fn with_workflow_routes(services: &Services) -> Router {
    inspection_router(Arc::clone(&services.inspections))
        .merge(certificate_router(Arc::clone(&services.certificates)))
        .merge(record_router(
            "/api/v1/advisories",
            Arc::clone(&services.advisories),
        ))
        .merge(record_router(
            "/api/v1/profiles",
            Arc::clone(&services.profiles),
        ))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
