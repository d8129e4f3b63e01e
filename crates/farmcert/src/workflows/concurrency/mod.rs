//! Version-stamped update protocol shared by every mutable record.
//!
//! Entities carry a [`Version`] that the client echoes back on every write. The
//! [`OptimisticConcurrencyGuard`] forwards the write to a [`VersionedRepository`], whose
//! conditional write applies the mutation only if the stored version still matches.

mod guard;
mod memory;
mod repository;

use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

pub use guard::{ConcurrencyError, OptimisticConcurrencyGuard};
pub use memory::InMemoryVersionedStore;
pub use repository::{RepositoryError, VersionedRepository};

/// Monotonic write counter. Starts at zero when a record is created.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(pub u64);

impl Version {
    pub const INITIAL: Version = Version(0);

    pub const fn next(self) -> Version {
        Version(self.0 + 1)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A record that participates in optimistic concurrency control.
pub trait VersionedEntity: Clone + Send + Sync + 'static {
    type Id: Clone + Eq + Hash + fmt::Display + fmt::Debug + Send + Sync + 'static;

    /// Human readable record kind used in conflict messages and logs.
    const KIND: &'static str;

    fn id(&self) -> &Self::Id;
    fn version(&self) -> Version;
    fn set_version(&mut self, version: Version);
}
