use std::marker::PhantomData;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{debug, warn};

use super::repository::{RepositoryError, VersionedRepository};
use super::{Version, VersionedEntity};
use crate::workflows::ValidationError;

/// Single entry point for every state-changing write to a versioned record.
///
/// The guard never retries and never merges: a stale caller gets
/// [`ConcurrencyError::Conflict`] and is expected to re-fetch before trying again.
pub struct OptimisticConcurrencyGuard<E, R> {
    repository: Arc<R>,
    entity: PhantomData<fn() -> E>,
}

impl<E, R> Clone for OptimisticConcurrencyGuard<E, R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            entity: PhantomData,
        }
    }
}

impl<E, R> OptimisticConcurrencyGuard<E, R>
where
    E: VersionedEntity,
    R: VersionedRepository<E>,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            entity: PhantomData,
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Load the current copy of a record, including its version.
    pub fn fetch(&self, id: &E::Id) -> Result<E, ConcurrencyError> {
        self.repository
            .get(id)
            .map_err(|err| ConcurrencyError::from_repository::<E>(id, err))?
            .ok_or_else(|| ConcurrencyError::NotFound {
                kind: E::KIND,
                id: id.to_string(),
            })
    }

    /// Apply `mutation` if `expected` is still the stored version. On success the returned
    /// record carries the new version, always `expected + 1`.
    pub fn apply<F>(&self, id: &E::Id, expected: Version, mutation: F) -> Result<E, ConcurrencyError>
    where
        F: FnOnce(&mut E) -> Result<(), ValidationError>,
    {
        match self.repository.compare_and_apply(id, expected, mutation) {
            Ok(updated) => {
                debug!(
                    kind = E::KIND,
                    %id,
                    version = %updated.version(),
                    "versioned write accepted"
                );
                Ok(updated)
            }
            Err(err) => {
                let err = ConcurrencyError::from_repository::<E>(id, err);
                if let ConcurrencyError::Conflict { current, .. } = &err {
                    warn!(
                        kind = E::KIND,
                        %id,
                        %expected,
                        %current,
                        "rejected stale write"
                    );
                }
                Err(err)
            }
        }
    }
}

/// Outcome of a refused versioned write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConcurrencyError {
    #[error(
        "{kind} {id} was changed by someone else since it was loaded \
         (loaded version {expected}, current version {current}); reload it and try again"
    )]
    Conflict {
        kind: &'static str,
        id: String,
        expected: Version,
        current: Version,
    },
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
    #[error("{kind} {id} already exists")]
    Duplicate { kind: &'static str, id: String },
    #[error(transparent)]
    Rejected(ValidationError),
    #[error("data store unavailable: {0}")]
    Unavailable(String),
}

impl ConcurrencyError {
    fn from_repository<E: VersionedEntity>(id: &E::Id, err: RepositoryError) -> Self {
        match err {
            RepositoryError::VersionMismatch { expected, found } => ConcurrencyError::Conflict {
                kind: E::KIND,
                id: id.to_string(),
                expected,
                current: found,
            },
            RepositoryError::NotFound => ConcurrencyError::NotFound {
                kind: E::KIND,
                id: id.to_string(),
            },
            RepositoryError::Rejected(violation) => ConcurrencyError::Rejected(violation),
            RepositoryError::AlreadyExists => ConcurrencyError::Duplicate {
                kind: E::KIND,
                id: id.to_string(),
            },
            RepositoryError::Unavailable(reason) => ConcurrencyError::Unavailable(reason),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ConcurrencyError::Conflict { .. } | ConcurrencyError::Duplicate { .. } => {
                StatusCode::CONFLICT
            }
            ConcurrencyError::NotFound { .. } => StatusCode::NOT_FOUND,
            ConcurrencyError::Rejected(_) => StatusCode::BAD_REQUEST,
            ConcurrencyError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ConcurrencyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ConcurrencyError::Rejected(violation) => return violation.clone().into_response(),
            ConcurrencyError::Conflict { current, .. } => json!({
                "error": self.to_string(),
                "reason": "stale_version",
                "current_version": current,
            }),
            ConcurrencyError::NotFound { .. } => json!({
                "error": self.to_string(),
                "reason": "not_found",
            }),
            ConcurrencyError::Duplicate { .. } => json!({
                "error": self.to_string(),
                "reason": "duplicate",
            }),
            ConcurrencyError::Unavailable(_) => json!({
                "error": self.to_string(),
                "reason": "unavailable",
            }),
        };
        (status, Json(body)).into_response()
    }
}
