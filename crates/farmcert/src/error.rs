use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::certificate::CertificateServiceError;
use crate::workflows::inspection::{InspectionServiceError, SessionError};
use crate::workflows::records::RecordServiceError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Inspection(InspectionServiceError),
    Session(SessionError),
    Certificate(CertificateServiceError),
    Record(RecordServiceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Inspection(err) => write!(f, "inspection error: {}", err),
            AppError::Session(err) => write!(f, "evaluation session error: {}", err),
            AppError::Certificate(err) => write!(f, "certificate error: {}", err),
            AppError::Record(err) => write!(f, "record error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Inspection(err) => Some(err),
            AppError::Session(err) => Some(err),
            AppError::Certificate(err) => Some(err),
            AppError::Record(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Inspection(err) => err.into_response(),
            AppError::Certificate(err) => err.into_response(),
            AppError::Record(err) => err.into_response(),
            AppError::Session(SessionError::Validation(err)) => err.into_response(),
            AppError::Session(SessionError::Concurrency(err)) => err.into_response(),
            other => {
                let body = Json(json!({ "error": other.to_string() }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<InspectionServiceError> for AppError {
    fn from(value: InspectionServiceError) -> Self {
        Self::Inspection(value)
    }
}

impl From<SessionError> for AppError {
    fn from(value: SessionError) -> Self {
        Self::Session(value)
    }
}

impl From<CertificateServiceError> for AppError {
    fn from(value: CertificateServiceError) -> Self {
        Self::Certificate(value)
    }
}

impl From<RecordServiceError> for AppError {
    fn from(value: RecordServiceError) -> Self {
        Self::Record(value)
    }
}
