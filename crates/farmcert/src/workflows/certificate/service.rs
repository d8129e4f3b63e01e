use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{
    cancellation_detail, CancellationState, Certificate, CertificateId, CertificatePolicy,
};
use crate::workflows::concurrency::{
    ConcurrencyError, OptimisticConcurrencyGuard, RepositoryError, Version, VersionedRepository,
};
use crate::workflows::inspection::{Inspection, InspectionId, InspectionResult, InspectionStatus};
use crate::workflows::ValidationError;

/// Request to certify the farm behind a finalized inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCertificate {
    pub inspection_id: InspectionId,
    pub effective_on: NaiveDate,
}

/// Committee-side certificate operations. Every change after issue goes through the guard.
pub struct CertificateService<C, I> {
    certificates: OptimisticConcurrencyGuard<Certificate, C>,
    inspections: OptimisticConcurrencyGuard<Inspection, I>,
    policy: CertificatePolicy,
}

impl<C, I> CertificateService<C, I>
where
    C: VersionedRepository<Certificate> + 'static,
    I: VersionedRepository<Inspection> + 'static,
{
    pub fn new(certificates: Arc<C>, inspections: Arc<I>, policy: CertificatePolicy) -> Self {
        Self {
            certificates: OptimisticConcurrencyGuard::new(certificates),
            inspections: OptimisticConcurrencyGuard::new(inspections),
            policy,
        }
    }

    pub fn policy(&self) -> &CertificatePolicy {
        &self.policy
    }

    /// One certificate per inspection; issuing twice reports a duplicate.
    pub fn issue(&self, request: IssueCertificate) -> Result<Certificate, CertificateServiceError> {
        let inspection = self.inspections.fetch(&request.inspection_id)?;
        if inspection.status != InspectionStatus::Finalized {
            return Err(ValidationError::InspectionNotFinalized {
                inspection_id: inspection.id.to_string(),
            }
            .into());
        }
        if inspection.result != InspectionResult::Pass {
            return Err(ValidationError::InspectionNotPassed {
                inspection_id: inspection.id.to_string(),
            }
            .into());
        }

        let certificate = Certificate {
            id: CertificateId(format!("cert-{}", inspection.id)),
            inspection_id: inspection.id,
            farm_id: inspection.farm_id,
            effective_on: request.effective_on,
            expires_on: self.policy.expiry_for(request.effective_on),
            cancellation: CancellationState::NotRequested,
            version: Version::INITIAL,
        };

        let stored = self.certificates.repository().insert(certificate)?;
        info!(
            certificate_id = %stored.id,
            inspection_id = %stored.inspection_id,
            expires_on = %stored.expires_on,
            "certificate issued"
        );
        Ok(stored)
    }

    pub fn get(&self, certificate_id: &CertificateId) -> Result<Certificate, CertificateServiceError> {
        Ok(self.certificates.fetch(certificate_id)?)
    }

    /// The detail is validated before the store is contacted.
    pub fn submit_cancellation_request(
        &self,
        certificate_id: &CertificateId,
        expected: Version,
        detail: &str,
        requested_on: NaiveDate,
    ) -> Result<Certificate, CertificateServiceError> {
        let detail = cancellation_detail(detail)?;
        let updated = self.certificates.apply(certificate_id, expected, |certificate| {
            certificate.request_cancellation(detail, requested_on)
        })?;
        info!(certificate_id = %updated.id, version = %updated.version, "cancellation requested");
        Ok(updated)
    }

    pub fn withdraw_cancellation_request(
        &self,
        certificate_id: &CertificateId,
        expected: Version,
    ) -> Result<Certificate, CertificateServiceError> {
        let updated = self.certificates.apply(
            certificate_id,
            expected,
            Certificate::withdraw_cancellation_request,
        )?;
        info!(certificate_id = %updated.id, version = %updated.version, "cancellation request withdrawn");
        Ok(updated)
    }

    pub fn apply_cancellation(
        &self,
        certificate_id: &CertificateId,
        expected: Version,
        applied_on: NaiveDate,
    ) -> Result<Certificate, CertificateServiceError> {
        let updated = self.certificates.apply(certificate_id, expected, |certificate| {
            certificate.apply_cancellation(applied_on)
        })?;
        info!(certificate_id = %updated.id, version = %updated.version, "certificate cancelled");
        Ok(updated)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CertificateServiceError {
    #[error(transparent)]
    Validation(ValidationError),
    #[error(transparent)]
    Concurrency(ConcurrencyError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<ValidationError> for CertificateServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ConcurrencyError> for CertificateServiceError {
    fn from(value: ConcurrencyError) -> Self {
        match value {
            ConcurrencyError::Rejected(violation) => Self::Validation(violation),
            other => Self::Concurrency(other),
        }
    }
}
