use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::service::EditableRecord;
use crate::workflows::concurrency::{Version, VersionedEntity};
use crate::workflows::inspection::FarmId;
use crate::workflows::validation::{bounded_text, optional_text};
use crate::workflows::ValidationError;

const NAME_MAX: usize = 100;
const PHONE_MAX: usize = 20;
const EMAIL_MAX: usize = 254;
const ADDRESS_MAX: usize = 255;

static PROFILE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

string_id!(ProfileId);

/// Editable contact details of a registered farmer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFields {
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub farms: Vec<FarmId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: ProfileId,
    #[serde(flatten)]
    pub fields: ProfileFields,
    pub version: Version,
}

impl VersionedEntity for ProfileRecord {
    type Id = ProfileId;
    const KIND: &'static str = "profile";

    fn id(&self) -> &ProfileId {
        &self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

fn phone(raw: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(value) = optional_text("phone", raw, PHONE_MAX)? else {
        return Ok(None);
    };
    let digits = value.chars().filter(char::is_ascii_digit).count();
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
    if !allowed || digits < 6 {
        return Err(ValidationError::InvalidFormat {
            field: "phone",
            expected: "a phone number of digits, spaces, '+', '-' or parentheses",
        });
    }
    Ok(Some(value))
}

fn email(raw: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(value) = optional_text("email", raw, EMAIL_MAX)? else {
        return Ok(None);
    };
    let well_formed = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    };
    if !well_formed {
        return Err(ValidationError::InvalidFormat {
            field: "email",
            expected: "an address of the form name@example.org",
        });
    }
    Ok(Some(value))
}

impl EditableRecord for ProfileRecord {
    type Fields = ProfileFields;

    fn validate(fields: ProfileFields) -> Result<ProfileFields, ValidationError> {
        Ok(ProfileFields {
            display_name: bounded_text("display_name", &fields.display_name, NAME_MAX)?,
            farms: fields.farms,
            phone: phone(fields.phone.as_deref())?,
            email: email(fields.email.as_deref())?,
            address: optional_text("address", fields.address.as_deref(), ADDRESS_MAX)?,
        })
    }

    fn next_id() -> ProfileId {
        let id = PROFILE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        ProfileId(format!("prof-{id:06}"))
    }

    fn create(id: ProfileId, fields: ProfileFields) -> Self {
        Self {
            id,
            fields,
            version: Version::INITIAL,
        }
    }

    fn replace(&mut self, fields: ProfileFields) {
        self.fields = fields;
    }
}
