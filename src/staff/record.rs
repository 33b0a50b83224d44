use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::lifecycle::{StaffState, StaffStatus};

/// Overwrite every field of `$target` that is `Some` in `$patch`.
macro_rules! merge_fields {
    ($target:expr, $patch:expr, [$($field:ident),+ $(,)?]) => {
        $(
            if let Some(value) = &$patch.$field {
                $target.$field = Some(value.clone());
            }
        )+
    };
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PersonalInfo {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub experience: Option<u32>,
    pub education: Option<String>,
    pub age: Option<u32>,
    pub marital_status: Option<String>,
    pub salary: Option<f64>,
    pub terms_accepted: Option<bool>,
}

impl PersonalInfo {
    pub fn merge(&mut self, patch: &PersonalInfo) {
        merge_fields!(self, patch, [
            name,
            gender,
            experience,
            education,
            age,
            marital_status,
            salary,
            terms_accepted,
        ]);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LocationInfo {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl LocationInfo {
    pub fn merge(&mut self, patch: &LocationInfo) {
        merge_fields!(self, patch, [city, state, country]);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfessionalInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub classrooms: Option<Vec<String>>,
    pub role: Option<String>,
    pub yearly_salary: Option<f64>,
    pub joining_date: Option<NaiveDate>,
}

impl ProfessionalInfo {
    pub fn merge(&mut self, patch: &ProfessionalInfo) {
        merge_fields!(self, patch, [email, phone, classrooms, role, yearly_salary, joining_date]);
    }
}

/// Partial form submission. Absent groups and absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaffPatch {
    pub personal: Option<PersonalInfo>,
    pub location: Option<LocationInfo>,
    pub professional: Option<ProfessionalInfo>,
}

impl StaffPatch {
    pub fn is_empty(&self) -> bool {
        self.personal.is_none() && self.location.is_none() && self.professional.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaffRecord {
    pub id: Uuid,
    pub draft_id: String,
    pub state: StaffState,
    pub personal: PersonalInfo,
    pub location: LocationInfo,
    pub professional: ProfessionalInfo,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl StaffRecord {
    pub fn new_draft(draft_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            draft_id: draft_id.into(),
            state: StaffState::Draft,
            personal: PersonalInfo::default(),
            location: LocationInfo::default(),
            professional: ProfessionalInfo::default(),
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }

    pub fn status(&self) -> StaffStatus {
        self.state.status()
    }

    pub fn staff_id(&self) -> Option<&str> {
        self.state.staff_id()
    }

    /// Deep-merge a patch into the field groups.
    pub fn apply_patch(&mut self, patch: &StaffPatch, now: DateTime<Utc>) {
        if let Some(personal) = &patch.personal {
            self.personal.merge(personal);
        }
        if let Some(location) = &patch.location {
            self.location.merge(location);
        }
        if let Some(professional) = &patch.professional {
            self.professional.merge(professional);
        }
        self.updated_at = now;
    }

    pub fn classrooms(&self) -> &[String] {
        self.professional.classrooms.as_deref().unwrap_or_default()
    }
}

/// Wire shape of a record. The password hash never leaves the process.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StaffView<'a> {
    id: Uuid,
    draft_id: &'a str,
    status: StaffStatus,
    staff_id: Option<&'a str>,
    personal: &'a PersonalInfo,
    location: &'a LocationInfo,
    professional: &'a ProfessionalInfo,
    verified_at: Option<DateTime<Utc>>,
    activated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_login_at: Option<DateTime<Utc>>,
}

impl Serialize for StaffRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        StaffView {
            id: self.id,
            draft_id: &self.draft_id,
            status: self.state.status(),
            staff_id: self.state.staff_id(),
            personal: &self.personal,
            location: &self.location,
            professional: &self.professional,
            verified_at: self.state.verified_at(),
            activated_at: self.state.activated_at(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_login_at: self.last_login_at,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn later_patch_overwrites_only_supplied_fields() {
        let now = Utc::now();
        let mut record = StaffRecord::new_draft("d-1", now);
        record.apply_patch(
            &serde_json::from_value(json!({ "personal": { "name": "A", "age": 30 } })).unwrap(),
            now,
        );
        record.apply_patch(
            &serde_json::from_value(json!({ "personal": { "age": 31 }, "professional": { "phone": "9999999999" } }))
                .unwrap(),
            now,
        );

        assert_eq!(record.personal.name.as_deref(), Some("A"));
        assert_eq!(record.personal.age, Some(31));
        assert_eq!(record.professional.phone.as_deref(), Some("9999999999"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_value::<StaffPatch>(json!({ "personal": { "nickname": "x" } }));
        assert!(result.is_err());
        let result = serde_json::from_value::<StaffPatch>(json!({ "auth": {} }));
        assert!(result.is_err());
    }

    #[test]
    fn serialized_record_hides_password_hash() {
        let now = Utc::now();
        let mut record = StaffRecord::new_draft("d-2", now);
        record.state = StaffState::Active {
            staff_id: "0001000001@classcify.in".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            verified_at: now,
            activated_at: now,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["status"], "active");
        assert_eq!(value["staffId"], "0001000001@classcify.in");
        assert_eq!(value["draftId"], "d-2");
        assert!(!value.to_string().contains("argon2id"));
    }

    fn opt<T: std::fmt::Debug + Clone + 'static>(inner: impl Strategy<Value = T>) -> impl Strategy<Value = Option<T>> {
        prop::option::of(inner)
    }

    fn personal_patch() -> impl Strategy<Value = PersonalInfo> {
        (opt("[a-z]{1,6}"), opt(0u32..40), opt(18u32..70), opt(any::<bool>())).prop_map(
            |(name, experience, age, terms_accepted)| PersonalInfo {
                name,
                experience,
                age,
                terms_accepted,
                ..Default::default()
            },
        )
    }

    fn location_patch() -> impl Strategy<Value = LocationInfo> {
        (opt("[A-Z][a-z]{2,8}"), opt("[A-Z][a-z]{2,8}")).prop_map(|(city, state)| LocationInfo {
            city,
            state,
            country: None,
        })
    }

    proptest! {
        #[test]
        fn merge_equals_last_write_per_field(
            patches in prop::collection::vec((opt(personal_patch()), opt(location_patch())), 1..8)
        ) {
            let now = Utc::now();
            let mut record = StaffRecord::new_draft("prop", now);
            for (personal, location) in &patches {
                let patch = StaffPatch { personal: personal.clone(), location: location.clone(), professional: None };
                record.apply_patch(&patch, now);
            }

            let last_name = patches.iter().rev().find_map(|(p, _)| p.as_ref().and_then(|p| p.name.clone()));
            let last_age = patches.iter().rev().find_map(|(p, _)| p.as_ref().and_then(|p| p.age));
            let last_city = patches.iter().rev().find_map(|(_, l)| l.as_ref().and_then(|l| l.city.clone()));
            prop_assert_eq!(record.personal.name, last_name);
            prop_assert_eq!(record.personal.age, last_age);
            prop_assert_eq!(record.location.city, last_city);
        }

        #[test]
        fn reapplying_a_patch_is_idempotent(personal in personal_patch(), location in location_patch()) {
            let now = Utc::now();
            let patch = StaffPatch { personal: Some(personal), location: Some(location), professional: None };
            let mut once = StaffRecord::new_draft("idem", now);
            once.apply_patch(&patch, now);
            let mut twice = once.clone();
            twice.apply_patch(&patch, now);
            prop_assert_eq!(once, twice);
        }
    }
}
