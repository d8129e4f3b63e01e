use std::sync::Arc;

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::concurrency::{
    InMemoryVersionedStore, RepositoryError, Version, VersionedRepository,
};
use crate::workflows::inspection::domain::{
    AuditorId, EvaluationMethod, EvaluationResult, FarmId, Inspection, InspectionId,
    InspectionItem, ItemEvaluation, ItemId, ItemSupplement, Requirement, RequirementClass,
    RequirementEvaluation, RequirementId, SessionId, Verdict,
};
use crate::workflows::inspection::{
    inspection_router, EvaluationConfig, InspectionResultCalculator, InspectionService,
    RequirementEvaluationStore, ResumptionTable, ScheduleInspection, StandardTemplate,
};
use crate::workflows::ValidationError;

pub(super) type MemoryRepository = InMemoryVersionedStore<Inspection>;
pub(super) type MemoryService = InspectionService<MemoryRepository, StandardTemplate>;

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn calculator() -> InspectionResultCalculator {
    InspectionResultCalculator::new(EvaluationConfig::default())
}

pub(super) fn requirement(
    id: &str,
    sequence: u16,
    class: RequirementClass,
    result: EvaluationResult,
) -> Requirement {
    Requirement {
        id: RequirementId::from(id),
        sequence,
        class,
        description: format!("requirement {id}"),
        result,
        method: if result == EvaluationResult::Unevaluated {
            EvaluationMethod::Pending
        } else {
            EvaluationMethod::Observation
        },
        note: None,
    }
}

/// `main_yes` passing main requirements followed by `main_no` failing ones, then
/// `secondary_total` secondary requirements of which the first `secondary_yes` pass.
pub(super) fn requirement_set(
    main_yes: usize,
    main_no: usize,
    secondary_yes: usize,
    secondary_total: usize,
) -> Vec<Requirement> {
    let mut requirements = Vec::new();
    let mut sequence = 0u16;
    let mut push = |class, result| {
        sequence += 1;
        requirements.push(requirement(
            &format!("r-{sequence:02}"),
            sequence,
            class,
            result,
        ));
    };

    for _ in 0..main_yes {
        push(RequirementClass::Main, EvaluationResult::Yes);
    }
    for _ in 0..main_no {
        push(RequirementClass::Main, EvaluationResult::No);
    }
    for index in 0..secondary_total {
        let result = if index < secondary_yes {
            EvaluationResult::Yes
        } else {
            EvaluationResult::No
        };
        push(RequirementClass::Secondary, result);
    }
    requirements
}

pub(super) fn item(id: &str, item_number: u16, requirements: Vec<Requirement>) -> InspectionItem {
    InspectionItem {
        id: ItemId::from(id),
        item_number,
        title: format!("item {id}"),
        requirements: RequirementEvaluationStore::new(requirements),
        result: Verdict::Fail,
        supplement: ItemSupplement::default(),
    }
}

pub(super) fn schedule_request() -> ScheduleInspection {
    ScheduleInspection {
        farm_id: FarmId::from("farm-042"),
        auditor_id: AuditorId::from("auditor-7"),
        scheduled_on: date(2025, 3, 14),
    }
}

pub(super) fn build_service() -> (MemoryService, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = InspectionService::new(
        repository.clone(),
        Arc::new(StandardTemplate),
        EvaluationConfig::default(),
    );
    (service, repository)
}

pub(super) fn session_id(raw: &str) -> SessionId {
    SessionId::from(raw)
}

pub(super) fn resumption() -> Arc<ResumptionTable> {
    Arc::new(ResumptionTable::default())
}

/// Evaluation payload answering every requirement of `item` with `result`.
pub(super) fn answer_item(item: &InspectionItem, result: EvaluationResult) -> ItemEvaluation {
    ItemEvaluation {
        item_id: item.id.clone(),
        requirements: item
            .requirements
            .iter()
            .map(|requirement| RequirementEvaluation {
                requirement_id: requirement.id.clone(),
                result,
                method: EvaluationMethod::Observation,
                note: None,
            })
            .collect(),
        supplement: None,
    }
}

/// Save a `YES` for every requirement, one item at a time, and return the last stored copy.
pub(super) fn answer_everything(service: &MemoryService, inspection: &Inspection) -> Inspection {
    let mut current = inspection.clone();
    for item in &inspection.items {
        current = service
            .save_item(
                &current.id,
                current.version,
                answer_item(item, EvaluationResult::Yes),
            )
            .expect("item saves");
    }
    current
}

/// Repository whose data store cannot be reached.
pub(super) struct UnavailableRepository;

impl VersionedRepository<Inspection> for UnavailableRepository {
    fn insert(&self, _entity: Inspection) -> Result<Inspection, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn get(&self, _id: &InspectionId) -> Result<Option<Inspection>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn compare_and_apply<F>(
        &self,
        _id: &InspectionId,
        _expected: Version,
        _mutation: F,
    ) -> Result<Inspection, RepositoryError>
    where
        F: FnOnce(&mut Inspection) -> Result<(), ValidationError>,
    {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Repository that reads from memory but times out on every versioned write.
#[derive(Default)]
pub(super) struct WriteTimeoutRepository {
    pub(super) records: MemoryRepository,
}

impl VersionedRepository<Inspection> for WriteTimeoutRepository {
    fn insert(&self, entity: Inspection) -> Result<Inspection, RepositoryError> {
        self.records.insert(entity)
    }

    fn get(&self, id: &InspectionId) -> Result<Option<Inspection>, RepositoryError> {
        self.records.get(id)
    }

    fn compare_and_apply<F>(
        &self,
        _id: &InspectionId,
        _expected: Version,
        _mutation: F,
    ) -> Result<Inspection, RepositoryError>
    where
        F: FnOnce(&mut Inspection) -> Result<(), ValidationError>,
    {
        Err(RepositoryError::Unavailable("write timed out".to_string()))
    }
}

/// Repository that already holds every id it is asked to insert.
pub(super) struct ConflictRepository;

impl VersionedRepository<Inspection> for ConflictRepository {
    fn insert(&self, _entity: Inspection) -> Result<Inspection, RepositoryError> {
        Err(RepositoryError::AlreadyExists)
    }

    fn get(&self, _id: &InspectionId) -> Result<Option<Inspection>, RepositoryError> {
        Ok(None)
    }

    fn compare_and_apply<F>(
        &self,
        _id: &InspectionId,
        _expected: Version,
        _mutation: F,
    ) -> Result<Inspection, RepositoryError>
    where
        F: FnOnce(&mut Inspection) -> Result<(), ValidationError>,
    {
        Err(RepositoryError::NotFound)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn inspection_router_with_service(service: MemoryService) -> axum::Router {
    inspection_router(Arc::new(service))
}
