use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::service::EditableRecord;
use crate::workflows::concurrency::{Version, VersionedEntity};
use crate::workflows::inspection::FarmId;
use crate::workflows::validation::bounded_text;
use crate::workflows::ValidationError;

pub const TOPIC_MAX: usize = 120;
pub const RECOMMENDATION_MAX: usize = 2000;
pub const ADVISOR_MAX: usize = 100;
const FARM_ID_MAX: usize = 64;

static ADVISORY_SEQUENCE: AtomicU64 = AtomicU64::new(1);

string_id!(
    /// Identifier wrapper for advisory notes left for a farm.
    AdvisoryId
);

/// Editable part of an advisory note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisoryFields {
    pub farm_id: FarmId,
    pub advisor: String,
    pub topic: String,
    pub recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_on: Option<NaiveDate>,
}

/// Extension-officer recommendation attached to a farm between inspections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisoryRecord {
    pub id: AdvisoryId,
    #[serde(flatten)]
    pub fields: AdvisoryFields,
    pub version: Version,
}

impl VersionedEntity for AdvisoryRecord {
    type Id = AdvisoryId;
    const KIND: &'static str = "advisory record";

    fn id(&self) -> &AdvisoryId {
        &self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

impl EditableRecord for AdvisoryRecord {
    type Fields = AdvisoryFields;

    fn validate(fields: AdvisoryFields) -> Result<AdvisoryFields, ValidationError> {
        let farm_id = bounded_text("farm_id", &fields.farm_id.0, FARM_ID_MAX)?;
        Ok(AdvisoryFields {
            farm_id: FarmId(farm_id),
            advisor: bounded_text("advisor", &fields.advisor, ADVISOR_MAX)?,
            topic: bounded_text("topic", &fields.topic, TOPIC_MAX)?,
            recommendation: bounded_text(
                "recommendation",
                &fields.recommendation,
                RECOMMENDATION_MAX,
            )?,
            follow_up_on: fields.follow_up_on,
        })
    }

    fn next_id() -> AdvisoryId {
        let id = ADVISORY_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        AdvisoryId(format!("adv-{id:06}"))
    }

    fn create(id: AdvisoryId, fields: AdvisoryFields) -> Self {
        Self {
            id,
            fields,
            version: Version::INITIAL,
        }
    }

    fn replace(&mut self, fields: AdvisoryFields) {
        self.fields = fields;
    }
}
