//! Field inspections: the requirement checklist, the stepwise auditor session and the
//! pass/fail rule applied when the committee finalizes a result.

pub mod domain;
pub mod evaluation;
pub mod resumption;
pub mod router;
pub mod service;
pub mod session;
pub mod store;
pub mod template;

#[cfg(test)]
mod tests;

pub use domain::{
    AuditorId, EvaluationMethod, EvaluationResult, FarmId, Inspection, InspectionId,
    InspectionItem, InspectionResult, InspectionStatus, ItemEvaluation, ItemId, ItemSupplement,
    Requirement, RequirementClass, RequirementEvaluation, RequirementId, SessionId, Verdict,
    WaterSourceKind,
};
pub use evaluation::{
    EvaluationConfig, FailReason, InspectionResultCalculator, VerdictBreakdown,
    DEFAULT_SECONDARY_PASS_THRESHOLD,
};
pub use resumption::{ResumptionStore, ResumptionTable};
pub use router::inspection_router;
pub use service::{InspectionService, InspectionServiceError, ScheduleInspection};
pub use session::{SessionError, StepwiseEvaluationSession};
pub use store::RequirementEvaluationStore;
pub use template::{
    instantiate_items, ItemTemplate, RequirementTemplate, RequirementTemplateProvider,
    StandardTemplate,
};
