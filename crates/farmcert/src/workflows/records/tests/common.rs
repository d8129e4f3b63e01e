use std::sync::Arc;

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::concurrency::InMemoryVersionedStore;
use crate::workflows::inspection::FarmId;
use crate::workflows::records::{
    AdvisoryFields, AdvisoryRecord, ProfileFields, ProfileRecord, RecordService,
};

pub(super) type AdvisoryStore = InMemoryVersionedStore<AdvisoryRecord>;
pub(super) type ProfileStore = InMemoryVersionedStore<ProfileRecord>;

pub(super) fn advisory_fields() -> AdvisoryFields {
    AdvisoryFields {
        farm_id: FarmId::from("farm-042"),
        advisor: "R. Mendez".to_string(),
        topic: "Irrigation water testing".to_string(),
        recommendation: "Send a well sample to the district lab before planting.".to_string(),
        follow_up_on: NaiveDate::from_ymd_opt(2025, 9, 1),
    }
}

pub(super) fn profile_fields() -> ProfileFields {
    ProfileFields {
        display_name: "Amara Okafor".to_string(),
        farms: vec![FarmId::from("farm-042")],
        phone: Some("+234 803 555 0101".to_string()),
        email: Some("amara@example.org".to_string()),
        address: Some("Plot 7, Ring Road".to_string()),
    }
}

pub(super) fn advisory_service() -> (RecordService<AdvisoryRecord, AdvisoryStore>, Arc<AdvisoryStore>) {
    let store = Arc::new(AdvisoryStore::default());
    (RecordService::new(store.clone()), store)
}

pub(super) fn profile_service() -> RecordService<ProfileRecord, ProfileStore> {
    RecordService::new(Arc::new(ProfileStore::default()))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
