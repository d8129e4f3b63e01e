//! Certificates issued for passing inspections and their cancellation lifecycle.

pub mod domain;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    CancellationState, Certificate, CertificateId, CertificatePolicy, CANCELLATION_DETAIL_MAX,
};
pub use router::certificate_router;
pub use service::{CertificateService, CertificateServiceError, IssueCertificate};
