use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Local, pre-flight failures. These never reach the data store and always tell the
/// caller what to fix.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{incomplete} requirement(s) still need a result and an evaluation method")]
    IncompleteRequirements { incomplete: usize },
    #[error("cannot {action} while the {entity} is {state}")]
    InvalidTransition {
        entity: &'static str,
        action: &'static str,
        state: &'static str,
    },
    #[error("inspection item {item_id} does not belong to this inspection")]
    UnknownItem { item_id: String },
    #[error("requirement {requirement_id} does not belong to item {item_id}")]
    UnknownRequirement {
        item_id: String,
        requirement_id: String,
    },
    #[error("item {item_id} expects {expected} answers, not {found}")]
    SupplementMismatch {
        item_id: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },
    #[error("{field} must be at most {max} characters (found {found})")]
    FieldTooLong {
        field: &'static str,
        max: usize,
        found: usize,
    },
    #[error("{field} must be {expected}")]
    InvalidFormat {
        field: &'static str,
        expected: &'static str,
    },
    #[error("inspection {inspection_id} has not been finalized")]
    InspectionNotFinalized { inspection_id: String },
    #[error("inspection {inspection_id} did not pass and cannot be certified")]
    InspectionNotPassed { inspection_id: String },
}

impl ValidationError {
    /// Name of the offending field, when the failure is about a single input.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::EmptyField { field }
            | ValidationError::FieldTooLong { field, .. }
            | ValidationError::InvalidFormat { field, .. } => Some(*field),
            _ => None,
        }
    }
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.to_string(),
            "reason": "validation",
            "field": self.field(),
        });
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

/// Like [`bounded_text`], but blank input means "not provided".
pub(crate) fn optional_text(
    field: &'static str,
    raw: Option<&str>,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    match raw {
        Some(value) if !value.trim().is_empty() => bounded_text(field, value, max).map(Some),
        _ => Ok(None),
    }
}

/// Trim `raw` and enforce a non-empty value of at most `max` characters.
pub(crate) fn bounded_text(
    field: &'static str,
    raw: &str,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }

    let found = trimmed.chars().count();
    if found > max {
        return Err(ValidationError::FieldTooLong { field, max, found });
    }

    Ok(trimmed.to_string())
}
