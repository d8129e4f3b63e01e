use std::sync::Arc;

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::certificate::{
    certificate_router, Certificate, CertificatePolicy, CertificateService, IssueCertificate,
};
use crate::workflows::concurrency::InMemoryVersionedStore;
use crate::workflows::inspection::{
    AuditorId, EvaluationConfig, EvaluationMethod, EvaluationResult, FarmId, Inspection,
    InspectionService, ItemEvaluation, RequirementClass, RequirementEvaluation,
    ScheduleInspection, StandardTemplate,
};

pub(super) type CertificateStore = InMemoryVersionedStore<Certificate>;
pub(super) type InspectionStore = InMemoryVersionedStore<Inspection>;
pub(super) type MemoryCertificates = CertificateService<CertificateStore, InspectionStore>;

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) struct Fixture {
    pub(super) inspections: InspectionService<InspectionStore, StandardTemplate>,
    pub(super) certificates: MemoryCertificates,
    pub(super) certificate_store: Arc<CertificateStore>,
}

pub(super) fn fixture() -> Fixture {
    let inspection_store = Arc::new(InspectionStore::default());
    let certificate_store = Arc::new(CertificateStore::default());
    Fixture {
        inspections: InspectionService::new(
            inspection_store.clone(),
            Arc::new(StandardTemplate),
            EvaluationConfig::default(),
        ),
        certificates: CertificateService::new(
            certificate_store.clone(),
            inspection_store,
            CertificatePolicy::default(),
        ),
        certificate_store,
    }
}

impl Fixture {
    /// Walk a fresh inspection to `stop_after`: 0 scheduled, 1 answered, 2 awaiting
    /// result, 3 finalized. `main_result` is used for every main requirement.
    pub(super) fn inspection(&self, stop_after: u8, main_result: EvaluationResult) -> Inspection {
        let mut current = self
            .inspections
            .schedule(ScheduleInspection {
                farm_id: FarmId::from("farm-042"),
                auditor_id: AuditorId::from("auditor-7"),
                scheduled_on: date(2025, 3, 14),
            })
            .expect("scheduled");
        if stop_after == 0 {
            return current;
        }

        for item in current.items.clone() {
            let evaluation = ItemEvaluation {
                item_id: item.id.clone(),
                requirements: item
                    .requirements
                    .iter()
                    .map(|requirement| RequirementEvaluation {
                        requirement_id: requirement.id.clone(),
                        result: match requirement.class {
                            RequirementClass::Main => main_result,
                            RequirementClass::Secondary => {
                                EvaluationResult::Yes
                            }
                        },
                        method: EvaluationMethod::DocumentReview,
                        note: None,
                    })
                    .collect(),
                supplement: None,
            };
            current = self
                .inspections
                .save_item(&current.id, current.version, evaluation)
                .expect("item saves");
        }
        if stop_after == 1 {
            return current;
        }

        current = self
            .inspections
            .complete(&current.id, current.version)
            .expect("inspection completes");
        if stop_after == 2 {
            return current;
        }

        self.inspections
            .finalize(&current.id, current.version, date(2025, 4, 2))
            .expect("inspection finalizes")
            .0
    }

    pub(super) fn issued(&self) -> Certificate {
        let inspection = self.inspection(3, EvaluationResult::Yes);
        self.certificates
            .issue(IssueCertificate {
                inspection_id: inspection.id,
                effective_on: date(2025, 4, 10),
            })
            .expect("certificate issues")
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router(fixture: Fixture) -> axum::Router {
    certificate_router(Arc::new(fixture.certificates))
}
