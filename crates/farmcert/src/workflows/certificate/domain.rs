use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::workflows::concurrency::{Version, VersionedEntity};
use crate::workflows::inspection::{FarmId, InspectionId};
use crate::workflows::validation::bounded_text;
use crate::workflows::ValidationError;

/// Longest cancellation detail accepted, in characters.
pub const CANCELLATION_DETAIL_MAX: usize = 255;

string_id!(CertificateId);

/// How long a newly issued certificate stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificatePolicy {
    pub validity_years: u8,
}

impl Default for CertificatePolicy {
    fn default() -> Self {
        Self { validity_years: 3 }
    }
}

impl CertificatePolicy {
    pub fn expiry_for(&self, effective_on: NaiveDate) -> NaiveDate {
        effective_on
            .checked_add_months(Months::new(u32::from(self.validity_years) * 12))
            .unwrap_or(NaiveDate::MAX)
    }
}

/// `NotRequested → Requested → Applied`; a pending request may be withdrawn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CancellationState {
    #[default]
    NotRequested,
    Requested {
        detail: String,
        requested_on: NaiveDate,
    },
    Applied {
        detail: String,
        applied_on: NaiveDate,
    },
}

impl CancellationState {
    pub const fn label(&self) -> &'static str {
        match self {
            CancellationState::NotRequested => "active",
            CancellationState::Requested { .. } => "pending cancellation",
            CancellationState::Applied { .. } => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: CertificateId,
    pub inspection_id: InspectionId,
    pub farm_id: FarmId,
    pub effective_on: NaiveDate,
    pub expires_on: NaiveDate,
    #[serde(default)]
    pub cancellation: CancellationState,
    pub version: Version,
}

impl VersionedEntity for Certificate {
    type Id = CertificateId;
    const KIND: &'static str = "certificate";

    fn id(&self) -> &CertificateId {
        &self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

impl Certificate {
    /// A certificate stays active until a cancellation is applied.
    pub fn is_active(&self) -> bool {
        !matches!(self.cancellation, CancellationState::Applied { .. })
    }

    pub fn cancellation_requested(&self) -> bool {
        !matches!(self.cancellation, CancellationState::NotRequested)
    }

    pub fn cancellation_detail(&self) -> Option<&str> {
        match &self.cancellation {
            CancellationState::NotRequested => None,
            CancellationState::Requested { detail, .. }
            | CancellationState::Applied { detail, .. } => Some(detail),
        }
    }

    fn invalid(&self, action: &'static str) -> ValidationError {
        ValidationError::InvalidTransition {
            entity: Certificate::KIND,
            action,
            state: self.cancellation.label(),
        }
    }

    pub(crate) fn request_cancellation(
        &mut self,
        detail: String,
        requested_on: NaiveDate,
    ) -> Result<(), ValidationError> {
        if self.cancellation != CancellationState::NotRequested {
            return Err(self.invalid("request cancellation"));
        }
        self.cancellation = CancellationState::Requested {
            detail,
            requested_on,
        };
        Ok(())
    }

    pub(crate) fn withdraw_cancellation_request(&mut self) -> Result<(), ValidationError> {
        match self.cancellation {
            CancellationState::Requested { .. } => {
                self.cancellation = CancellationState::NotRequested;
                Ok(())
            }
            _ => Err(self.invalid("withdraw a cancellation request")),
        }
    }

    pub(crate) fn apply_cancellation(&mut self, applied_on: NaiveDate) -> Result<(), ValidationError> {
        match std::mem::take(&mut self.cancellation) {
            CancellationState::Requested { detail, .. } => {
                self.cancellation = CancellationState::Applied { detail, applied_on };
                Ok(())
            }
            other => {
                self.cancellation = other;
                Err(self.invalid("apply a cancellation"))
            }
        }
    }
}

/// Trim and bound the free-text reason given for a cancellation request.
pub fn cancellation_detail(raw: &str) -> Result<String, ValidationError> {
    bounded_text("cancellation_detail", raw, CANCELLATION_DETAIL_MAX)
}
