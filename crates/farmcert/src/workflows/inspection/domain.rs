use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::evaluation::InspectionResultCalculator;
use super::store::RequirementEvaluationStore;
use crate::workflows::concurrency::{Version, VersionedEntity};
use crate::workflows::ValidationError;

string_id!(
    /// Identifier wrapper for scheduled inspections.
    InspectionId
);
string_id!(ItemId);
string_id!(RequirementId);
string_id!(
    /// Auditor who owns the field walkthrough.
    AuditorId
);
string_id!(FarmId);
string_id!(
    /// One client walkthrough; resumption points are scoped to it.
    SessionId
);

/// Whether a requirement is mandatory or counted toward the compliance percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementClass {
    Main,
    Secondary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationResult {
    #[default]
    Unevaluated,
    Yes,
    No,
    NotApplicable,
}

/// How the auditor verified a requirement in the field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMethod {
    #[default]
    Pending,
    Observation,
    Interview,
    DocumentReview,
    Sampling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub const fn label(self) -> &'static str {
        match self {
            Verdict::Pass => "pass",
            Verdict::Fail => "fail",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionStatus {
    Scheduled,
    InProgress,
    AwaitingResult,
    Finalized,
}

impl InspectionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            InspectionStatus::Scheduled => "scheduled",
            InspectionStatus::InProgress => "in_progress",
            InspectionStatus::AwaitingResult => "awaiting_result",
            InspectionStatus::Finalized => "finalized",
        }
    }

    /// Items may only be edited before the auditor hands the inspection over.
    pub const fn accepts_evaluations(self) -> bool {
        matches!(
            self,
            InspectionStatus::Scheduled | InspectionStatus::InProgress
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionResult {
    Pending,
    Pass,
    Fail,
}

impl From<Verdict> for InspectionResult {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Pass => InspectionResult::Pass,
            Verdict::Fail => InspectionResult::Fail,
        }
    }
}

/// A single checklist line evaluated during the field visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: RequirementId,
    pub sequence: u16,
    pub class: RequirementClass,
    pub description: String,
    #[serde(default)]
    pub result: EvaluationResult,
    #[serde(default)]
    pub method: EvaluationMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Requirement {
    pub fn is_complete(&self) -> bool {
        self.result != EvaluationResult::Unevaluated && self.method != EvaluationMethod::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterSourceKind {
    Well,
    River,
    IrrigationCanal,
    Rainwater,
    Municipal,
}

/// Item-specific answers recorded next to the requirements. The calculator never reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "item_type", rename_all = "snake_case")]
pub enum ItemSupplement {
    LandHistory {
        previous_land_use: Option<String>,
        contamination_risk: Option<bool>,
    },
    WaterSource {
        source: Option<WaterSourceKind>,
        last_tested_on: Option<NaiveDate>,
    },
    AgroInputs {
        storage_locked: Option<bool>,
        registered_products_only: Option<bool>,
    },
    Harvest {
        containers_clean: Option<bool>,
        estimated_yield_kg: Option<u32>,
    },
    Generic {
        #[serde(default)]
        answers: BTreeMap<String, String>,
    },
}

impl Default for ItemSupplement {
    fn default() -> Self {
        ItemSupplement::Generic {
            answers: BTreeMap::new(),
        }
    }
}

impl ItemSupplement {
    pub const fn item_type(&self) -> &'static str {
        match self {
            ItemSupplement::LandHistory { .. } => "land_history",
            ItemSupplement::WaterSource { .. } => "water_source",
            ItemSupplement::AgroInputs { .. } => "agro_inputs",
            ItemSupplement::Harvest { .. } => "harvest",
            ItemSupplement::Generic { .. } => "generic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionItem {
    pub id: ItemId,
    /// Position of the item in the master template.
    pub item_number: u16,
    pub title: String,
    pub requirements: RequirementEvaluationStore,
    pub result: Verdict,
    #[serde(default)]
    pub supplement: ItemSupplement,
}

/// Auditor input for one requirement, as submitted on save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementEvaluation {
    pub requirement_id: RequirementId,
    pub result: EvaluationResult,
    pub method: EvaluationMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Everything an auditor may change on one item. Template fields are not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemEvaluation {
    pub item_id: ItemId,
    pub requirements: Vec<RequirementEvaluation>,
    /// `None` keeps the stored answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplement: Option<ItemSupplement>,
}

impl From<&InspectionItem> for ItemEvaluation {
    fn from(item: &InspectionItem) -> Self {
        Self {
            item_id: item.id.clone(),
            requirements: item
                .requirements
                .iter()
                .map(|requirement| RequirementEvaluation {
                    requirement_id: requirement.id.clone(),
                    result: requirement.result,
                    method: requirement.method,
                    note: requirement.note.clone(),
                })
                .collect(),
            supplement: Some(item.supplement.clone()),
        }
    }
}

/// Root aggregate for one farm visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
    pub id: InspectionId,
    pub farm_id: FarmId,
    pub auditor_id: AuditorId,
    pub scheduled_on: NaiveDate,
    pub status: InspectionStatus,
    pub result: InspectionResult,
    pub version: Version,
    pub items: Vec<InspectionItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalized_on: Option<NaiveDate>,
}

impl VersionedEntity for Inspection {
    type Id = InspectionId;
    const KIND: &'static str = "inspection";

    fn id(&self) -> &InspectionId {
        &self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

impl Inspection {
    pub fn item(&self, item_id: &ItemId) -> Option<&InspectionItem> {
        self.items.iter().find(|item| &item.id == item_id)
    }

    pub fn incomplete_requirements(&self) -> usize {
        self.items
            .iter()
            .map(|item| item.requirements.incomplete_count())
            .sum()
    }

    /// Sort items by template order and each item's requirements by sequence number.
    pub fn normalize_order(&mut self) {
        self.items.sort_by_key(|item| item.item_number);
        for item in &mut self.items {
            item.requirements.sort_by_sequence();
        }
    }

    fn ensure_status(
        &self,
        allowed: impl Fn(InspectionStatus) -> bool,
        action: &'static str,
    ) -> Result<(), ValidationError> {
        if allowed(self.status) {
            Ok(())
        } else {
            Err(ValidationError::InvalidTransition {
                entity: Inspection::KIND,
                action,
                state: self.status.label(),
            })
        }
    }

    /// Copy the auditor's evaluations for one item into the stored aggregate.
    pub(crate) fn record_item(
        &mut self,
        incoming: &ItemEvaluation,
        calculator: &InspectionResultCalculator,
    ) -> Result<(), ValidationError> {
        self.ensure_status(InspectionStatus::accepts_evaluations, "edit items")?;

        let stored = self
            .items
            .iter_mut()
            .find(|item| item.id == incoming.item_id)
            .ok_or_else(|| ValidationError::UnknownItem {
                item_id: incoming.item_id.to_string(),
            })?;

        if let Some(supplement) = &incoming.supplement {
            if supplement.item_type() != stored.supplement.item_type() {
                return Err(ValidationError::SupplementMismatch {
                    item_id: stored.id.to_string(),
                    expected: stored.supplement.item_type(),
                    found: supplement.item_type(),
                });
            }
        }

        stored
            .requirements
            .merge_evaluations(&incoming.requirements)
            .map_err(|requirement_id| ValidationError::UnknownRequirement {
                item_id: incoming.item_id.to_string(),
                requirement_id: requirement_id.to_string(),
            })?;
        if let Some(supplement) = &incoming.supplement {
            stored.supplement = supplement.clone();
        }
        stored.result = calculator.item_verdict(stored);

        if self.status == InspectionStatus::Scheduled {
            self.status = InspectionStatus::InProgress;
        }
        Ok(())
    }

    /// Hand the walkthrough over for a result once every requirement is complete.
    pub(crate) fn submit_for_result(&mut self) -> Result<(), ValidationError> {
        self.ensure_status(
            InspectionStatus::accepts_evaluations,
            "complete the evaluation",
        )?;

        let incomplete = self.incomplete_requirements();
        if incomplete > 0 {
            return Err(ValidationError::IncompleteRequirements { incomplete });
        }

        self.status = InspectionStatus::AwaitingResult;
        Ok(())
    }

    /// Derive the inspection verdict and close the inspection.
    pub(crate) fn finalize(
        &mut self,
        calculator: &InspectionResultCalculator,
        finalized_on: NaiveDate,
    ) -> Result<(), ValidationError> {
        self.ensure_status(
            |status| status == InspectionStatus::AwaitingResult,
            "finalize the result",
        )?;

        let incomplete = self.incomplete_requirements();
        if incomplete > 0 {
            return Err(ValidationError::IncompleteRequirements { incomplete });
        }

        for item in &mut self.items {
            item.result = calculator.item_verdict(item);
        }
        self.result = calculator.inspection_breakdown(&self.items).verdict.into();
        self.status = InspectionStatus::Finalized;
        self.finalized_on = Some(finalized_on);
        Ok(())
    }
}
