//! Secondary versioned records (advisory notes and farmer profiles) edited through the
//! same optimistic-concurrency guard as inspections and certificates.

pub mod advisory;
pub mod profile;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use advisory::{AdvisoryFields, AdvisoryId, AdvisoryRecord};
pub use profile::{ProfileFields, ProfileId, ProfileRecord};
pub use router::record_router;
pub use service::{EditableRecord, RecordService, RecordServiceError};
