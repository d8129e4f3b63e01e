use serde::{Deserialize, Serialize};

use super::domain::{
    EvaluationMethod, EvaluationResult, Requirement, RequirementEvaluation, RequirementId,
};

/// Mutable evaluation state for the requirements of one inspection item.
///
/// Setters only touch held state. They accept every enumerated value and report an
/// unknown requirement id by returning `false` instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Requirement>", into = "Vec<Requirement>")]
pub struct RequirementEvaluationStore {
    requirements: Vec<Requirement>,
}

impl From<Vec<Requirement>> for RequirementEvaluationStore {
    fn from(requirements: Vec<Requirement>) -> Self {
        Self::new(requirements)
    }
}

impl From<RequirementEvaluationStore> for Vec<Requirement> {
    fn from(store: RequirementEvaluationStore) -> Self {
        store.requirements
    }
}

impl RequirementEvaluationStore {
    pub fn new(requirements: Vec<Requirement>) -> Self {
        let mut store = Self { requirements };
        store.sort_by_sequence();
        store
    }

    pub(crate) fn sort_by_sequence(&mut self) {
        self.requirements
            .sort_by_key(|requirement| requirement.sequence);
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn iter(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements.iter()
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn get(&self, requirement_id: &RequirementId) -> Option<&Requirement> {
        self.requirements
            .iter()
            .find(|requirement| &requirement.id == requirement_id)
    }

    fn get_mut(&mut self, requirement_id: &RequirementId) -> Option<&mut Requirement> {
        self.requirements
            .iter_mut()
            .find(|requirement| &requirement.id == requirement_id)
    }

    pub fn set_result(&mut self, requirement_id: &RequirementId, result: EvaluationResult) -> bool {
        match self.get_mut(requirement_id) {
            Some(requirement) => {
                requirement.result = result;
                true
            }
            None => false,
        }
    }

    pub fn set_method(&mut self, requirement_id: &RequirementId, method: EvaluationMethod) -> bool {
        match self.get_mut(requirement_id) {
            Some(requirement) => {
                requirement.method = method;
                true
            }
            None => false,
        }
    }

    /// Blank text clears the note.
    pub fn set_note(&mut self, requirement_id: &RequirementId, text: impl Into<String>) -> bool {
        let text = text.into();
        match self.get_mut(requirement_id) {
            Some(requirement) => {
                requirement.note = if text.trim().is_empty() {
                    None
                } else {
                    Some(text)
                };
                true
            }
            None => false,
        }
    }

    pub fn is_complete(&self, requirement_id: &RequirementId) -> bool {
        self.get(requirement_id)
            .map(Requirement::is_complete)
            .unwrap_or(false)
    }

    pub fn all_complete(&self) -> bool {
        self.requirements.iter().all(Requirement::is_complete)
    }

    pub fn incomplete_count(&self) -> usize {
        self.requirements
            .iter()
            .filter(|requirement| !requirement.is_complete())
            .count()
    }

    /// Copy result, method and note for every listed requirement. Returns the first id
    /// that is not held here; nothing is copied in that case.
    pub(crate) fn merge_evaluations(
        &mut self,
        incoming: &[RequirementEvaluation],
    ) -> Result<(), RequirementId> {
        if let Some(unknown) = incoming
            .iter()
            .find(|evaluation| self.get(&evaluation.requirement_id).is_none())
        {
            return Err(unknown.requirement_id.clone());
        }

        for evaluation in incoming {
            if let Some(requirement) = self.get_mut(&evaluation.requirement_id) {
                requirement.result = evaluation.result;
                requirement.method = evaluation.method;
                requirement.note = evaluation.note.clone();
            }
        }
        Ok(())
    }
}
