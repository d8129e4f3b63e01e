use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{Certificate, CertificateId};
use super::service::{CertificateService, CertificateServiceError, IssueCertificate};
use crate::workflows::concurrency::{Version, VersionedRepository};
use crate::workflows::inspection::Inspection;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationRequestBody {
    pub version: Version,
    pub detail: String,
    pub requested_on: NaiveDate,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WithdrawalBody {
    pub version: Version,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CancellationBody {
    pub version: Version,
    pub applied_on: NaiveDate,
}

/// Certificate as returned over HTTP, with the derived flags spelled out.
#[derive(Debug, Clone, Serialize)]
pub struct CertificateView {
    #[serde(flatten)]
    pub certificate: Certificate,
    pub active: bool,
    pub cancellation_requested: bool,
}

impl From<Certificate> for CertificateView {
    fn from(certificate: Certificate) -> Self {
        Self {
            active: certificate.is_active(),
            cancellation_requested: certificate.cancellation_requested(),
            certificate,
        }
    }
}

pub fn certificate_router<C, I>(service: Arc<CertificateService<C, I>>) -> Router
where
    C: VersionedRepository<Certificate> + 'static,
    I: VersionedRepository<Inspection> + 'static,
{
    Router::new()
        .route("/api/v1/certificates", post(issue_handler::<C, I>))
        .route(
            "/api/v1/certificates/:certificate_id",
            get(certificate_handler::<C, I>),
        )
        .route(
            "/api/v1/certificates/:certificate_id/cancellation-request",
            post(request_cancellation_handler::<C, I>)
                .delete(withdraw_cancellation_handler::<C, I>),
        )
        .route(
            "/api/v1/certificates/:certificate_id/cancellation",
            post(apply_cancellation_handler::<C, I>),
        )
        .with_state(service)
}

impl IntoResponse for CertificateServiceError {
    fn into_response(self) -> Response {
        match self {
            CertificateServiceError::Validation(violation) => violation.into_response(),
            CertificateServiceError::Concurrency(conflict) => conflict.into_response(),
            CertificateServiceError::Repository(err) => err.into_response(),
        }
    }
}

fn certificate_response(
    status: StatusCode,
    result: Result<Certificate, CertificateServiceError>,
) -> Response {
    match result {
        Ok(certificate) => (status, axum::Json(CertificateView::from(certificate))).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn issue_handler<C, I>(
    State(service): State<Arc<CertificateService<C, I>>>,
    axum::Json(request): axum::Json<IssueCertificate>,
) -> Response
where
    C: VersionedRepository<Certificate> + 'static,
    I: VersionedRepository<Inspection> + 'static,
{
    certificate_response(StatusCode::CREATED, service.issue(request))
}

pub(crate) async fn certificate_handler<C, I>(
    State(service): State<Arc<CertificateService<C, I>>>,
    Path(certificate_id): Path<String>,
) -> Response
where
    C: VersionedRepository<Certificate> + 'static,
    I: VersionedRepository<Inspection> + 'static,
{
    certificate_response(StatusCode::OK, service.get(&CertificateId(certificate_id)))
}

pub(crate) async fn request_cancellation_handler<C, I>(
    State(service): State<Arc<CertificateService<C, I>>>,
    Path(certificate_id): Path<String>,
    axum::Json(body): axum::Json<CancellationRequestBody>,
) -> Response
where
    C: VersionedRepository<Certificate> + 'static,
    I: VersionedRepository<Inspection> + 'static,
{
    let result = service.submit_cancellation_request(
        &CertificateId(certificate_id),
        body.version,
        &body.detail,
        body.requested_on,
    );
    certificate_response(StatusCode::OK, result)
}

pub(crate) async fn withdraw_cancellation_handler<C, I>(
    State(service): State<Arc<CertificateService<C, I>>>,
    Path(certificate_id): Path<String>,
    axum::Json(body): axum::Json<WithdrawalBody>,
) -> Response
where
    C: VersionedRepository<Certificate> + 'static,
    I: VersionedRepository<Inspection> + 'static,
{
    let result =
        service.withdraw_cancellation_request(&CertificateId(certificate_id), body.version);
    certificate_response(StatusCode::OK, result)
}

pub(crate) async fn apply_cancellation_handler<C, I>(
    State(service): State<Arc<CertificateService<C, I>>>,
    Path(certificate_id): Path<String>,
    axum::Json(body): axum::Json<CancellationBody>,
) -> Response
where
    C: VersionedRepository<Certificate> + 'static,
    I: VersionedRepository<Inspection> + 'static,
{
    let result =
        service.apply_cancellation(&CertificateId(certificate_id), body.version, body.applied_on);
    certificate_response(StatusCode::OK, result)
}
