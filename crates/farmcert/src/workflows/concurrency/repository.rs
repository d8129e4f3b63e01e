use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::{Version, VersionedEntity};
use crate::workflows::ValidationError;

/// Persistence boundary for versioned records.
///
/// There is no unconditional `update`: every write after `insert` goes
/// through [`VersionedRepository::compare_and_apply`].
pub trait VersionedRepository<E: VersionedEntity>: Send + Sync {
    fn insert(&self, entity: E) -> Result<E, RepositoryError>;

    fn get(&self, id: &E::Id) -> Result<Option<E>, RepositoryError>;

    /// Apply `mutation` and bump the version by one iff the stored version equals
    /// `expected`. The check, the mutation and the increment must be indivisible with
    /// respect to other writers. If the mutation rejects the change, nothing is stored.
    fn compare_and_apply<F>(
        &self,
        id: &E::Id,
        expected: Version,
        mutation: F,
    ) -> Result<E, RepositoryError>
    where
        F: FnOnce(&mut E) -> Result<(), ValidationError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    AlreadyExists,
    #[error("record not found")]
    NotFound,
    #[error("stored version {found} does not match expected version {expected}")]
    VersionMismatch { expected: Version, found: Version },
    #[error(transparent)]
    Rejected(#[from] ValidationError),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl IntoResponse for RepositoryError {
    fn into_response(self) -> Response {
        let (status, reason) = match self {
            RepositoryError::Rejected(violation) => return violation.into_response(),
            RepositoryError::AlreadyExists => (StatusCode::CONFLICT, "duplicate"),
            RepositoryError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            RepositoryError::VersionMismatch { .. } => (StatusCode::CONFLICT, "stale_version"),
            RepositoryError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
        };
        let body = json!({
            "error": self.to_string(),
            "reason": reason,
        });
        (status, Json(body)).into_response()
    }
}
