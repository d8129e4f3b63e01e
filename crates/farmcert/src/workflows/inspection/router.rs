use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{
    Inspection, InspectionId, ItemEvaluation, ItemId, ItemSupplement, RequirementEvaluation,
};
use super::evaluation::VerdictBreakdown;
use super::service::{InspectionService, InspectionServiceError, ScheduleInspection};
use super::template::RequirementTemplateProvider;
use crate::workflows::concurrency::{Version, VersionedRepository};

/// Body of `PUT /items/:item_id`. `version` is the inspection version the client loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveItemRequest {
    pub version: Version,
    pub requirements: Vec<RequirementEvaluation>,
    #[serde(default)]
    pub supplement: Option<ItemSupplement>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CompleteRequest {
    pub version: Version,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FinalizeRequest {
    pub version: Version,
    pub finalized_on: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerdictView {
    pub inspection_id: InspectionId,
    pub summary: String,
    #[serde(flatten)]
    pub breakdown: VerdictBreakdown,
}

impl VerdictView {
    fn new(inspection_id: InspectionId, breakdown: VerdictBreakdown) -> Self {
        Self {
            inspection_id,
            summary: breakdown.summary(),
            breakdown,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalizedView {
    pub inspection: Inspection,
    pub verdict: VerdictView,
}

/// Router exposing scheduling, item saves, completion and finalization.
pub fn inspection_router<R, T>(service: Arc<InspectionService<R, T>>) -> Router
where
    R: VersionedRepository<Inspection> + 'static,
    T: RequirementTemplateProvider + 'static,
{
    Router::new()
        .route("/api/v1/inspections", post(schedule_handler::<R, T>))
        .route(
            "/api/v1/inspections/:inspection_id",
            get(inspection_handler::<R, T>),
        )
        .route(
            "/api/v1/inspections/:inspection_id/verdict",
            get(verdict_handler::<R, T>),
        )
        .route(
            "/api/v1/inspections/:inspection_id/items/:item_id",
            put(save_item_handler::<R, T>),
        )
        .route(
            "/api/v1/inspections/:inspection_id/complete",
            post(complete_handler::<R, T>),
        )
        .route(
            "/api/v1/inspections/:inspection_id/finalize",
            post(finalize_handler::<R, T>),
        )
        .with_state(service)
}

impl IntoResponse for InspectionServiceError {
    fn into_response(self) -> Response {
        match self {
            InspectionServiceError::Validation(violation) => violation.into_response(),
            InspectionServiceError::Concurrency(conflict) => conflict.into_response(),
            InspectionServiceError::Repository(err) => err.into_response(),
        }
    }
}

pub(crate) async fn schedule_handler<R, T>(
    State(service): State<Arc<InspectionService<R, T>>>,
    axum::Json(request): axum::Json<ScheduleInspection>,
) -> Response
where
    R: VersionedRepository<Inspection> + 'static,
    T: RequirementTemplateProvider + 'static,
{
    match service.schedule(request) {
        Ok(inspection) => (StatusCode::CREATED, axum::Json(inspection)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn inspection_handler<R, T>(
    State(service): State<Arc<InspectionService<R, T>>>,
    Path(inspection_id): Path<String>,
) -> Response
where
    R: VersionedRepository<Inspection> + 'static,
    T: RequirementTemplateProvider + 'static,
{
    match service.get(&InspectionId(inspection_id)) {
        Ok(inspection) => (StatusCode::OK, axum::Json(inspection)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn verdict_handler<R, T>(
    State(service): State<Arc<InspectionService<R, T>>>,
    Path(inspection_id): Path<String>,
) -> Response
where
    R: VersionedRepository<Inspection> + 'static,
    T: RequirementTemplateProvider + 'static,
{
    let id = InspectionId(inspection_id);
    match service.preview(&id) {
        Ok(breakdown) => {
            (StatusCode::OK, axum::Json(VerdictView::new(id, breakdown))).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn save_item_handler<R, T>(
    State(service): State<Arc<InspectionService<R, T>>>,
    Path((inspection_id, item_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<SaveItemRequest>,
) -> Response
where
    R: VersionedRepository<Inspection> + 'static,
    T: RequirementTemplateProvider + 'static,
{
    let evaluation = ItemEvaluation {
        item_id: ItemId(item_id),
        requirements: request.requirements,
        supplement: request.supplement,
    };
    match service.save_item(&InspectionId(inspection_id), request.version, evaluation) {
        Ok(inspection) => (StatusCode::OK, axum::Json(inspection)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn complete_handler<R, T>(
    State(service): State<Arc<InspectionService<R, T>>>,
    Path(inspection_id): Path<String>,
    axum::Json(request): axum::Json<CompleteRequest>,
) -> Response
where
    R: VersionedRepository<Inspection> + 'static,
    T: RequirementTemplateProvider + 'static,
{
    match service.complete(&InspectionId(inspection_id), request.version) {
        Ok(inspection) => (StatusCode::OK, axum::Json(inspection)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn finalize_handler<R, T>(
    State(service): State<Arc<InspectionService<R, T>>>,
    Path(inspection_id): Path<String>,
    axum::Json(request): axum::Json<FinalizeRequest>,
) -> Response
where
    R: VersionedRepository<Inspection> + 'static,
    T: RequirementTemplateProvider + 'static,
{
    let id = InspectionId(inspection_id);
    match service.finalize(&id, request.version, request.finalized_on) {
        Ok((inspection, breakdown)) => {
            let view = FinalizedView {
                inspection,
                verdict: VerdictView::new(id, breakdown),
            };
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(err) => err.into_response(),
    }
}
