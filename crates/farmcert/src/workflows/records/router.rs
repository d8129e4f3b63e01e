use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use super::service::{EditableRecord, RecordService, RecordServiceError};
use crate::workflows::concurrency::{Version, VersionedRepository};

/// Edit payload: the full set of editable fields plus the version the client loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionedFields<F> {
    pub version: Version,
    #[serde(flatten)]
    pub fields: F,
}

/// Mount create, fetch and edit routes for one record kind under `base`, for example
/// `/api/v1/advisories`.
pub fn record_router<E, R>(base: &str, service: Arc<RecordService<E, R>>) -> Router
where
    E: EditableRecord,
    E::Id: From<String>,
    R: VersionedRepository<E> + 'static,
{
    Router::new()
        .route(base, post(create_handler::<E, R>))
        .route(
            &format!("{base}/:record_id"),
            get(record_handler::<E, R>).put(edit_handler::<E, R>),
        )
        .with_state(service)
}

impl IntoResponse for RecordServiceError {
    fn into_response(self) -> Response {
        match self {
            RecordServiceError::Validation(violation) => violation.into_response(),
            RecordServiceError::Concurrency(conflict) => conflict.into_response(),
            RecordServiceError::Repository(err) => err.into_response(),
        }
    }
}

pub(crate) async fn create_handler<E, R>(
    State(service): State<Arc<RecordService<E, R>>>,
    axum::Json(fields): axum::Json<E::Fields>,
) -> Response
where
    E: EditableRecord,
    R: VersionedRepository<E> + 'static,
{
    match service.create(fields) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn record_handler<E, R>(
    State(service): State<Arc<RecordService<E, R>>>,
    Path(record_id): Path<String>,
) -> Response
where
    E: EditableRecord,
    E::Id: From<String>,
    R: VersionedRepository<E> + 'static,
{
    let id: E::Id = record_id.into();
    match service.get(&id) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn edit_handler<E, R>(
    State(service): State<Arc<RecordService<E, R>>>,
    Path(record_id): Path<String>,
    axum::Json(request): axum::Json<VersionedFields<E::Fields>>,
) -> Response
where
    E: EditableRecord,
    E::Id: From<String>,
    R: VersionedRepository<E> + 'static,
{
    let id: E::Id = record_id.into();
    match service.edit(&id, request.version, request.fields) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(err) => err.into_response(),
    }
}
