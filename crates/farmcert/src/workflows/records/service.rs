use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::workflows::concurrency::{
    ConcurrencyError, OptimisticConcurrencyGuard, RepositoryError, Version, VersionedEntity,
    VersionedRepository,
};
use crate::workflows::ValidationError;

/// A versioned record whose editable fields are replaced wholesale on every edit.
pub trait EditableRecord: VersionedEntity + Serialize {
    /// Client-supplied fields, validated and normalized before any write.
    type Fields: DeserializeOwned + Serialize + Clone + Send + 'static;

    fn validate(fields: Self::Fields) -> Result<Self::Fields, ValidationError>;
    fn next_id() -> Self::Id;
    fn create(id: Self::Id, fields: Self::Fields) -> Self;
    fn replace(&mut self, fields: Self::Fields);
}

/// Create, read and versioned edit of one record kind.
pub struct RecordService<E, R> {
    guard: OptimisticConcurrencyGuard<E, R>,
}

impl<E, R> RecordService<E, R>
where
    E: EditableRecord,
    R: VersionedRepository<E> + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            guard: OptimisticConcurrencyGuard::new(repository),
        }
    }

    pub fn create(&self, fields: E::Fields) -> Result<E, RecordServiceError> {
        let fields = E::validate(fields)?;
        let record = E::create(E::next_id(), fields);
        let stored = self.guard.repository().insert(record)?;
        info!(kind = E::KIND, id = %stored.id(), "record created");
        Ok(stored)
    }

    pub fn get(&self, id: &E::Id) -> Result<E, RecordServiceError> {
        Ok(self.guard.fetch(id)?)
    }

    /// Validate locally, then replace the editable fields if `expected` is current.
    pub fn edit(
        &self,
        id: &E::Id,
        expected: Version,
        fields: E::Fields,
    ) -> Result<E, RecordServiceError> {
        let fields = E::validate(fields)?;
        let updated = self.guard.apply(id, expected, move |record| {
            record.replace(fields);
            Ok(())
        })?;
        Ok(updated)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordServiceError {
    #[error(transparent)]
    Validation(ValidationError),
    #[error(transparent)]
    Concurrency(ConcurrencyError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<ValidationError> for RecordServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ConcurrencyError> for RecordServiceError {
    fn from(value: ConcurrencyError) -> Self {
        match value {
            ConcurrencyError::Rejected(violation) => Self::Validation(violation),
            other => Self::Concurrency(other),
        }
    }
}
