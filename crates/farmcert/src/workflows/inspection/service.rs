use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{
    AuditorId, FarmId, Inspection, InspectionId, InspectionResult, InspectionStatus,
    ItemEvaluation, SessionId,
};
use super::evaluation::{EvaluationConfig, InspectionResultCalculator, VerdictBreakdown};
use super::resumption::ResumptionStore;
use super::session::{SessionError, StepwiseEvaluationSession};
use super::template::{instantiate_items, RequirementTemplateProvider};
use crate::workflows::concurrency::{
    ConcurrencyError, OptimisticConcurrencyGuard, RepositoryError, Version, VersionedRepository,
};
use crate::workflows::ValidationError;

static INSPECTION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_inspection_id() -> InspectionId {
    let id = INSPECTION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    InspectionId(format!("insp-{id:06}"))
}

/// Payload used to put a new inspection on an auditor's schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleInspection {
    pub farm_id: FarmId,
    pub auditor_id: AuditorId,
    pub scheduled_on: NaiveDate,
}

/// Service composing the template provider, the calculator and the concurrency guard.
pub struct InspectionService<R, T> {
    guard: OptimisticConcurrencyGuard<Inspection, R>,
    templates: Arc<T>,
    calculator: InspectionResultCalculator,
}

impl<R, T> InspectionService<R, T>
where
    R: VersionedRepository<Inspection> + 'static,
    T: RequirementTemplateProvider + 'static,
{
    pub fn new(repository: Arc<R>, templates: Arc<T>, config: EvaluationConfig) -> Self {
        Self {
            guard: OptimisticConcurrencyGuard::new(repository),
            templates,
            calculator: InspectionResultCalculator::new(config),
        }
    }

    pub fn guard(&self) -> &OptimisticConcurrencyGuard<Inspection, R> {
        &self.guard
    }

    pub fn calculator(&self) -> &InspectionResultCalculator {
        &self.calculator
    }

    /// Create an inspection pre-populated from the requirement template.
    pub fn schedule(
        &self,
        request: ScheduleInspection,
    ) -> Result<Inspection, InspectionServiceError> {
        let id = next_inspection_id();
        let items = instantiate_items(&id, self.templates.items(), &self.calculator);

        let inspection = Inspection {
            id,
            farm_id: request.farm_id,
            auditor_id: request.auditor_id,
            scheduled_on: request.scheduled_on,
            status: InspectionStatus::Scheduled,
            result: InspectionResult::Pending,
            version: Version::INITIAL,
            items,
            finalized_on: None,
        };

        let stored = self.guard.repository().insert(inspection)?;
        info!(
            inspection_id = %stored.id,
            farm_id = %stored.farm_id,
            auditor_id = %stored.auditor_id,
            items = stored.items.len(),
            "inspection scheduled"
        );
        Ok(stored)
    }

    pub fn get(&self, inspection_id: &InspectionId) -> Result<Inspection, InspectionServiceError> {
        let mut inspection = self.guard.fetch(inspection_id)?;
        inspection.normalize_order();
        Ok(inspection)
    }

    /// Verdict of the stored evaluations, whether or not the inspection is finalized.
    pub fn preview(
        &self,
        inspection_id: &InspectionId,
    ) -> Result<VerdictBreakdown, InspectionServiceError> {
        let inspection = self.guard.fetch(inspection_id)?;
        Ok(self.calculator.inspection_breakdown(&inspection.items))
    }

    pub fn save_item(
        &self,
        inspection_id: &InspectionId,
        expected: Version,
        evaluation: ItemEvaluation,
    ) -> Result<Inspection, InspectionServiceError> {
        let calculator = self.calculator;
        let mut updated = self.guard.apply(inspection_id, expected, |inspection| {
            inspection.record_item(&evaluation, &calculator)
        })?;
        updated.normalize_order();
        Ok(updated)
    }

    /// Move the inspection to `AwaitingResult`. Incomplete requirements are reported
    /// before any conditional write is attempted.
    pub fn complete(
        &self,
        inspection_id: &InspectionId,
        expected: Version,
    ) -> Result<Inspection, InspectionServiceError> {
        let current = self.guard.fetch(inspection_id)?;
        let incomplete = current.incomplete_requirements();
        if current.version == expected && incomplete > 0 {
            return Err(ValidationError::IncompleteRequirements { incomplete }.into());
        }

        let updated = self
            .guard
            .apply(inspection_id, expected, Inspection::submit_for_result)?;
        info!(inspection_id = %updated.id, version = %updated.version, "inspection awaiting result");
        Ok(updated)
    }

    /// Committee decision: derive the verdict from the stored evaluations and close the
    /// inspection.
    pub fn finalize(
        &self,
        inspection_id: &InspectionId,
        expected: Version,
        finalized_on: NaiveDate,
    ) -> Result<(Inspection, VerdictBreakdown), InspectionServiceError> {
        let calculator = self.calculator;
        let mut updated = self.guard.apply(inspection_id, expected, |inspection| {
            inspection.finalize(&calculator, finalized_on)
        })?;
        updated.normalize_order();

        let breakdown = self.calculator.inspection_breakdown(&updated.items);
        info!(
            inspection_id = %updated.id,
            verdict = breakdown.verdict.label(),
            version = %updated.version,
            "inspection result finalized"
        );
        Ok((updated, breakdown))
    }

    /// Start an auditor walkthrough backed by this service's repository.
    pub fn open_session<P: ResumptionStore>(
        &self,
        session_id: SessionId,
        inspection_id: InspectionId,
        resumption: Arc<P>,
    ) -> Result<StepwiseEvaluationSession<R, P>, SessionError> {
        StepwiseEvaluationSession::load(
            session_id,
            inspection_id,
            self.guard.clone(),
            resumption,
            self.calculator,
        )
    }
}

/// Error raised by the inspection service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InspectionServiceError {
    #[error(transparent)]
    Validation(ValidationError),
    #[error(transparent)]
    Concurrency(ConcurrencyError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<ValidationError> for InspectionServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ConcurrencyError> for InspectionServiceError {
    fn from(value: ConcurrencyError) -> Self {
        match value {
            ConcurrencyError::Rejected(violation) => Self::Validation(violation),
            other => Self::Concurrency(other),
        }
    }
}
