use chrono::NaiveDate;
use farmcert::workflows::certificate::{Certificate, CertificatePolicy, CertificateService};
use farmcert::workflows::concurrency::InMemoryVersionedStore;
use farmcert::workflows::inspection::{
    EvaluationConfig, Inspection, InspectionService, StandardTemplate,
};
use farmcert::workflows::records::{AdvisoryRecord, ProfileRecord, RecordService};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type InspectionStore = InMemoryVersionedStore<Inspection>;
pub(crate) type CertificateStore = InMemoryVersionedStore<Certificate>;
pub(crate) type AdvisoryStore = InMemoryVersionedStore<AdvisoryRecord>;
pub(crate) type ProfileStore = InMemoryVersionedStore<ProfileRecord>;

pub(crate) type Inspections = InspectionService<InspectionStore, StandardTemplate>;
pub(crate) type Certificates = CertificateService<CertificateStore, InspectionStore>;
pub(crate) type Advisories = RecordService<AdvisoryRecord, AdvisoryStore>;
pub(crate) type Profiles = RecordService<ProfileRecord, ProfileStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Every workflow service, wired to one set of in-memory stores.
#[derive(Clone)]
pub(crate) struct Services {
    pub(crate) inspections: Arc<Inspections>,
    pub(crate) certificates: Arc<Certificates>,
    pub(crate) advisories: Arc<Advisories>,
    pub(crate) profiles: Arc<Profiles>,
}

impl Services {
    pub(crate) fn in_memory(evaluation: EvaluationConfig, policy: CertificatePolicy) -> Self {
        let inspection_store = Arc::new(InspectionStore::default());
        Self {
            inspections: Arc::new(InspectionService::new(
                Arc::clone(&inspection_store),
                Arc::new(StandardTemplate),
                evaluation,
            )),
            certificates: Arc::new(CertificateService::new(
                Arc::new(CertificateStore::default()),
                inspection_store,
                policy,
            )),
            advisories: Arc::new(RecordService::new(Arc::new(AdvisoryStore::default()))),
            profiles: Arc::new(RecordService::new(Arc::new(ProfileStore::default()))),
        }
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
