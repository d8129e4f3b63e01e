use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::repository::{RepositoryError, VersionedRepository};
use super::{Version, VersionedEntity};
use crate::workflows::ValidationError;

/// Process-local store. The version check and the write happen under one lock
/// acquisition, which is what makes `compare_and_apply` atomic.
pub struct InMemoryVersionedStore<E: VersionedEntity> {
    records: Arc<Mutex<HashMap<E::Id, E>>>,
}

impl<E: VersionedEntity> Default for InMemoryVersionedStore<E> {
    fn default() -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<E: VersionedEntity> Clone for InMemoryVersionedStore<E> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

impl<E: VersionedEntity> InMemoryVersionedStore<E> {
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<E::Id, E>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }

    pub fn len(&self) -> Result<usize, RepositoryError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, RepositoryError> {
        Ok(self.lock()?.is_empty())
    }
}

impl<E: VersionedEntity> VersionedRepository<E> for InMemoryVersionedStore<E> {
    fn insert(&self, entity: E) -> Result<E, RepositoryError> {
        let mut records = self.lock()?;
        if records.contains_key(entity.id()) {
            return Err(RepositoryError::AlreadyExists);
        }
        records.insert(entity.id().clone(), entity.clone());
        Ok(entity)
    }

    fn get(&self, id: &E::Id) -> Result<Option<E>, RepositoryError> {
        let records = self.lock()?;
        Ok(records.get(id).cloned())
    }

    fn compare_and_apply<F>(
        &self,
        id: &E::Id,
        expected: Version,
        mutation: F,
    ) -> Result<E, RepositoryError>
    where
        F: FnOnce(&mut E) -> Result<(), ValidationError>,
    {
        let mut records = self.lock()?;
        let stored = records.get_mut(id).ok_or(RepositoryError::NotFound)?;

        let found = stored.version();
        if found != expected {
            return Err(RepositoryError::VersionMismatch { expected, found });
        }

        // Mutate a copy so a rejected mutation leaves the stored record untouched.
        let mut candidate = stored.clone();
        mutation(&mut candidate)?;
        candidate.set_version(found.next());
        *stored = candidate.clone();
        Ok(candidate)
    }
}
