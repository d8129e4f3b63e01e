use std::sync::Arc;

use tracing::{debug, info};

use super::domain::{
    EvaluationMethod, EvaluationResult, Inspection, InspectionId, InspectionItem,
    InspectionStatus, ItemEvaluation, ItemId, ItemSupplement, RequirementId, SessionId, Verdict,
};
use super::evaluation::{InspectionResultCalculator, VerdictBreakdown};
use super::resumption::ResumptionStore;
use super::store::RequirementEvaluationStore;
use crate::workflows::concurrency::{
    ConcurrencyError, OptimisticConcurrencyGuard, Version, VersionedRepository,
};
use crate::workflows::ValidationError;

/// An auditor's walk through the items of one inspection.
///
/// Navigation is free-form and never writes. Every write goes through the guard with the
/// version observed at load (or at the last accepted save). A failed save leaves the
/// cursor and all local edits exactly as they were, so the same call can be retried.
pub struct StepwiseEvaluationSession<R, P> {
    session_id: SessionId,
    inspection_id: InspectionId,
    guard: OptimisticConcurrencyGuard<Inspection, R>,
    resumption: Arc<P>,
    calculator: InspectionResultCalculator,
    items: Vec<InspectionItem>,
    cursor: usize,
    observed_version: Version,
    status: InspectionStatus,
}

impl<R, P> StepwiseEvaluationSession<R, P>
where
    R: VersionedRepository<Inspection>,
    P: ResumptionStore,
{
    /// Fetch the inspection and restore the cursor from the resumption point, if any.
    pub fn load(
        session_id: SessionId,
        inspection_id: InspectionId,
        guard: OptimisticConcurrencyGuard<Inspection, R>,
        resumption: Arc<P>,
        calculator: InspectionResultCalculator,
    ) -> Result<Self, SessionError> {
        let mut inspection = guard.fetch(&inspection_id)?;
        inspection.normalize_order();

        let cursor = resumption
            .position(&session_id, &inspection_id)
            .filter(|index| *index < inspection.items.len())
            .unwrap_or(0);

        debug!(%session_id, %inspection_id, cursor, "evaluation session loaded");

        Ok(Self {
            session_id,
            inspection_id,
            guard,
            resumption,
            calculator,
            cursor,
            observed_version: inspection.version,
            status: inspection.status,
            items: inspection.items,
        })
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn inspection_id(&self) -> &InspectionId {
        &self.inspection_id
    }

    pub fn items(&self) -> &[InspectionItem] {
        &self.items
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn observed_version(&self) -> Version {
        self.observed_version
    }

    pub fn status(&self) -> InspectionStatus {
        self.status
    }

    pub fn current_item(&self) -> Option<&InspectionItem> {
        self.items.get(self.cursor)
    }

    pub fn go_next(&mut self) {
        if !self.items.is_empty() {
            self.cursor = (self.cursor + 1) % self.items.len();
        }
    }

    pub fn go_previous(&mut self) {
        if !self.items.is_empty() {
            self.cursor = (self.cursor + self.items.len() - 1) % self.items.len();
        }
    }

    /// Move straight to an item; out-of-range indices are ignored.
    pub fn jump_to(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.cursor = index;
            true
        } else {
            false
        }
    }

    pub fn current_requirements_mut(&mut self) -> Option<&mut RequirementEvaluationStore> {
        self.items
            .get_mut(self.cursor)
            .map(|item| &mut item.requirements)
    }

    pub fn set_result(&mut self, requirement_id: &RequirementId, result: EvaluationResult) -> bool {
        self.current_requirements_mut()
            .map(|store| store.set_result(requirement_id, result))
            .unwrap_or(false)
    }

    pub fn set_method(&mut self, requirement_id: &RequirementId, method: EvaluationMethod) -> bool {
        self.current_requirements_mut()
            .map(|store| store.set_method(requirement_id, method))
            .unwrap_or(false)
    }

    pub fn set_note(&mut self, requirement_id: &RequirementId, text: impl Into<String>) -> bool {
        self.current_requirements_mut()
            .map(|store| store.set_note(requirement_id, text))
            .unwrap_or(false)
    }

    pub fn set_supplement(&mut self, supplement: ItemSupplement) -> bool {
        match self.items.get_mut(self.cursor) {
            Some(item) => {
                item.supplement = supplement;
                true
            }
            None => false,
        }
    }

    /// Live verdict for the item under the cursor, including unsaved edits.
    pub fn current_item_verdict(&self) -> Option<Verdict> {
        self.current_item()
            .map(|item| self.calculator.item_verdict(item))
    }

    /// Live inspection-level verdict, including unsaved edits.
    pub fn preview(&self) -> VerdictBreakdown {
        self.calculator.inspection_breakdown(&self.items)
    }

    pub fn incomplete_requirements(&self) -> usize {
        self.items
            .iter()
            .map(|item| item.requirements.incomplete_count())
            .sum()
    }

    pub fn can_complete(&self) -> bool {
        self.items.iter().all(|item| item.requirements.all_complete())
    }

    /// Persist only the item under the cursor.
    pub fn save_current_item(&mut self) -> Result<(), SessionError> {
        self.ensure_editable("edit items")?;
        let Some(item) = self.items.get(self.cursor).cloned() else {
            return Ok(());
        };

        let calculator = self.calculator;
        let evaluation = ItemEvaluation::from(&item);
        let updated = self
            .guard
            .apply(&self.inspection_id, self.observed_version, |inspection| {
                inspection.record_item(&evaluation, &calculator)
            })?;

        self.absorb(&updated, Some(&item.id));
        self.resumption
            .record(&self.session_id, &self.inspection_id, self.cursor);
        debug!(
            session_id = %self.session_id,
            inspection_id = %self.inspection_id,
            item_id = %item.id,
            version = %self.observed_version,
            "inspection item saved"
        );
        Ok(())
    }

    /// Persist every item regardless of the cursor.
    pub fn save_all_items(&mut self) -> Result<(), SessionError> {
        self.ensure_editable("edit items")?;

        let evaluations = self.evaluations();
        let calculator = self.calculator;
        let updated = self
            .guard
            .apply(&self.inspection_id, self.observed_version, |inspection| {
                evaluations
                    .iter()
                    .try_for_each(|evaluation| inspection.record_item(evaluation, &calculator))
            })?;

        self.absorb(&updated, None);
        self.resumption
            .record(&self.session_id, &self.inspection_id, self.cursor);
        debug!(
            session_id = %self.session_id,
            inspection_id = %self.inspection_id,
            version = %self.observed_version,
            "all inspection items saved"
        );
        Ok(())
    }

    /// Save everything and hand the inspection over for a result. Refused locally, without
    /// contacting the store, while any requirement is incomplete.
    pub fn complete(&mut self) -> Result<(), SessionError> {
        if !self.can_complete() {
            return Err(ValidationError::IncompleteRequirements {
                incomplete: self.incomplete_requirements(),
            }
            .into());
        }
        self.ensure_editable("complete the evaluation")?;

        let evaluations = self.evaluations();
        let calculator = self.calculator;
        let updated = self
            .guard
            .apply(&self.inspection_id, self.observed_version, |inspection| {
                evaluations
                    .iter()
                    .try_for_each(|evaluation| inspection.record_item(evaluation, &calculator))?;
                inspection.submit_for_result()
            })?;

        self.absorb(&updated, None);
        self.resumption.clear(&self.session_id, &self.inspection_id);
        info!(
            session_id = %self.session_id,
            inspection_id = %self.inspection_id,
            version = %self.observed_version,
            "inspection submitted for result"
        );
        Ok(())
    }

    /// Discard local state and re-fetch, keeping the cursor when it is still in range.
    /// This is the recovery path after a conflict.
    pub fn reload(&mut self) -> Result<(), SessionError> {
        let mut inspection = self.guard.fetch(&self.inspection_id)?;
        inspection.normalize_order();

        if self.cursor >= inspection.items.len() {
            self.cursor = 0;
        }
        self.observed_version = inspection.version;
        self.status = inspection.status;
        self.items = inspection.items;
        Ok(())
    }

    fn evaluations(&self) -> Vec<ItemEvaluation> {
        self.items.iter().map(ItemEvaluation::from).collect()
    }

    fn ensure_editable(&self, action: &'static str) -> Result<(), ValidationError> {
        if self.status.accepts_evaluations() {
            Ok(())
        } else {
            Err(ValidationError::InvalidTransition {
                entity: "inspection",
                action,
                state: self.status.label(),
            })
        }
    }

    /// Take the stored copy of saved items; unsaved edits on other items are kept.
    fn absorb(&mut self, updated: &Inspection, only: Option<&ItemId>) {
        self.observed_version = updated.version;
        self.status = updated.status;
        for item in &mut self.items {
            if only.map_or(true, |id| id == &item.id) {
                if let Some(stored) = updated.item(&item.id) {
                    let mut stored = stored.clone();
                    stored.requirements.sort_by_sequence();
                    *item = stored;
                }
            }
        }
    }
}

/// Typed failure of a session operation. The session state is unchanged in every case.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(ValidationError),
    #[error(transparent)]
    Concurrency(ConcurrencyError),
}

impl SessionError {
    /// True when the only way forward is [`StepwiseEvaluationSession::reload`].
    pub fn requires_reload(&self) -> bool {
        matches!(
            self,
            SessionError::Concurrency(ConcurrencyError::Conflict { .. })
        )
    }
}

impl From<ValidationError> for SessionError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ConcurrencyError> for SessionError {
    fn from(value: ConcurrencyError) -> Self {
        match value {
            ConcurrencyError::Rejected(violation) => Self::Validation(violation),
            other => Self::Concurrency(other),
        }
    }
}
