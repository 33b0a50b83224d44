use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::staff::lifecycle::{StaffState, StaffStatus};
use crate::staff::otp::OtpGrant;
use crate::staff::record::{ProfessionalInfo, StaffPatch, StaffRecord};
use crate::staff::store::{StaffStore, StoreError};

#[derive(Default)]
struct Inner {
    records: HashMap<Uuid, StaffRecord>,
    by_draft: HashMap<String, Uuid>,
    by_staff_id: HashMap<String, Uuid>,
    grants: HashMap<String, OtpGrant>,
}

impl Inner {
    fn by_draft_mut(&mut self, draft_id: &str) -> Option<&mut StaffRecord> {
        let id = self.by_draft.get(draft_id)?;
        self.records.get_mut(id)
    }
}

/// Process-local store. Every operation runs under one write lock, which is
/// what makes consume-and-promote atomic here.
#[derive(Default)]
pub struct MemoryStaffStore {
    inner: RwLock<Inner>,
}

impl MemoryStaffStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current grant for a draft, if any.
    pub async fn otp_grant(&self, draft_id: &str) -> Option<OtpGrant> {
        self.inner.read().await.grants.get(draft_id).cloned()
    }
}

#[async_trait]
impl StaffStore for MemoryStaffStore {
    async fn upsert_draft(
        &self,
        draft_id: &str,
        patch: &StaffPatch,
        now: DateTime<Utc>,
    ) -> Result<StaffRecord, StoreError> {
        let mut inner = self.inner.write().await;

        if !inner.by_draft.contains_key(draft_id) {
            let record = StaffRecord::new_draft(draft_id, now);
            inner.by_draft.insert(draft_id.to_string(), record.id);
            inner.records.insert(record.id, record);
        }

        let record = inner
            .by_draft_mut(draft_id)
            .ok_or_else(|| StoreError::Corrupt(format!("dangling draft index {}", draft_id)))?;
        if record.status() != StaffStatus::Draft {
            return Err(StoreError::StateConflict(format!(
                "registration {} is already {}",
                draft_id,
                record.status()
            )));
        }
        record.apply_patch(patch, now);
        Ok(record.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<StaffRecord>, StoreError> {
        Ok(self.inner.read().await.records.get(&id).cloned())
    }

    async fn find_by_draft_id(&self, draft_id: &str) -> Result<Option<StaffRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_draft
            .get(draft_id)
            .and_then(|id| inner.records.get(id))
            .cloned())
    }

    async fn find_by_staff_id(&self, staff_id: &str) -> Result<Option<StaffRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_staff_id
            .get(staff_id)
            .and_then(|id| inner.records.get(id))
            .cloned())
    }

    async fn put_otp(
        &self,
        draft_id: &str,
        grant: OtpGrant,
        phone: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .by_draft_mut(draft_id)
            .ok_or_else(|| StoreError::NotFound(draft_id.to_string()))?;
        if record.status() != StaffStatus::Draft {
            return Err(StoreError::StateConflict(format!(
                "registration {} is already {}",
                draft_id,
                record.status()
            )));
        }

        record.apply_patch(
            &StaffPatch {
                professional: Some(ProfessionalInfo {
                    phone: Some(phone.to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            },
            now,
        );
        inner.grants.insert(draft_id.to_string(), grant);
        Ok(())
    }

    async fn consume_otp_and_promote(
        &self,
        draft_id: &str,
        code_hash: &str,
        now: DateTime<Utc>,
        next: &StaffState,
    ) -> Result<StaffRecord, StoreError> {
        let mut inner = self.inner.write().await;

        match inner.grants.get(draft_id) {
            Some(grant) if grant.accepts(code_hash, now) => {}
            _ => return Err(StoreError::CodeRejected),
        }

        let staff_id = next
            .staff_id()
            .ok_or_else(|| StoreError::StateConflict("promotion target has no staff id".to_string()))?
            .to_string();
        if inner.by_staff_id.contains_key(&staff_id) {
            return Err(StoreError::StaffIdTaken(staff_id));
        }

        let record = inner
            .by_draft_mut(draft_id)
            .ok_or_else(|| StoreError::NotFound(draft_id.to_string()))?;
        if record.status() != StaffStatus::Draft {
            return Err(StoreError::StateConflict(format!("{} is already {}", draft_id, record.status())));
        }
        record.state = next.clone();
        record.updated_at = now;
        let promoted = record.clone();

        inner.grants.remove(draft_id);
        inner.by_staff_id.insert(staff_id, promoted.id);
        Ok(promoted)
    }

    async fn activate(&self, id: Uuid, next: &StaffState, now: DateTime<Utc>) -> Result<StaffRecord, StoreError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .records
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if record.status() != StaffStatus::Verified {
            return Err(StoreError::StateConflict(format!("{} is {}", id, record.status())));
        }
        record.state = next.clone();
        record.updated_at = now;
        Ok(record.clone())
    }

    async fn record_login(&self, id: Uuid, now: DateTime<Utc>) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .records
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.last_login_at = Some(now);
        Ok(())
    }

    async fn list_by_status(&self, statuses: &[StaffStatus]) -> Result<Vec<StaffRecord>, StoreError> {
        let inner = self.inner.read().await;
        let mut records: Vec<StaffRecord> = inner
            .records
            .values()
            .filter(|r| statuses.contains(&r.status()))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        patch: &StaffPatch,
        now: DateTime<Utc>,
    ) -> Result<StaffRecord, StoreError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .records
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.apply_patch(patch, now);
        Ok(record.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(record) = inner.records.remove(&id) else {
            return Ok(false);
        };
        inner.by_draft.remove(&record.draft_id);
        inner.grants.remove(&record.draft_id);
        if let Some(staff_id) = record.staff_id() {
            inner.by_staff_id.remove(staff_id);
        }
        Ok(true)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staff::otp::hash_code;
    use assert_matches::assert_matches;
    use chrono::Duration;
    use std::sync::Arc;

    fn verified(staff_id: &str, at: DateTime<Utc>) -> StaffState {
        StaffState::Verified {
            staff_id: staff_id.to_string(),
            verified_at: at,
        }
    }

    async fn draft_with_code(store: &MemoryStaffStore, draft_id: &str, code: &str) -> DateTime<Utc> {
        let now = Utc::now();
        store.upsert_draft(draft_id, &StaffPatch::default(), now).await.unwrap();
        let grant = OtpGrant::issue(draft_id, code, now, Duration::minutes(10));
        store.put_otp(draft_id, grant, "9999999999", now).await.unwrap();
        now
    }

    #[tokio::test]
    async fn new_grant_replaces_old_one() {
        let store = MemoryStaffStore::new();
        let now = draft_with_code(&store, "d1", "111111").await;
        let grant = OtpGrant::issue("d1", "222222", now, Duration::minutes(10));
        store.put_otp("d1", grant, "9999999999", now).await.unwrap();

        let next = verified("0001000001@classcify.in", now);
        let stale = store
            .consume_otp_and_promote("d1", &hash_code("d1", "111111"), now, &next)
            .await;
        assert_matches!(stale, Err(StoreError::CodeRejected));

        let fresh = store
            .consume_otp_and_promote("d1", &hash_code("d1", "222222"), now, &next)
            .await
            .unwrap();
        assert_eq!(fresh.status(), StaffStatus::Verified);
    }

    #[tokio::test]
    async fn grant_is_dead_at_expiry_instant() {
        let store = MemoryStaffStore::new();
        let now = draft_with_code(&store, "d1", "111111").await;
        let expiry = now + Duration::minutes(10);

        let result = store
            .consume_otp_and_promote("d1", &hash_code("d1", "111111"), expiry, &verified("x@classcify.in", expiry))
            .await;
        assert_matches!(result, Err(StoreError::CodeRejected));
    }

    #[tokio::test]
    async fn taken_staff_id_leaves_grant_in_place() {
        let store = MemoryStaffStore::new();
        let now = draft_with_code(&store, "d1", "111111").await;
        draft_with_code(&store, "d2", "222222").await;

        let next = verified("0001000001@classcify.in", now);
        store
            .consume_otp_and_promote("d1", &hash_code("d1", "111111"), now, &next)
            .await
            .unwrap();

        let clash = store
            .consume_otp_and_promote("d2", &hash_code("d2", "222222"), now, &next)
            .await;
        assert_matches!(clash, Err(StoreError::StaffIdTaken(_)));
        assert!(store.otp_grant("d2").await.is_some());
        assert_eq!(
            store.find_by_draft_id("d2").await.unwrap().unwrap().status(),
            StaffStatus::Draft
        );
    }

    #[tokio::test]
    async fn grant_for_verified_record_is_refused() {
        let store = MemoryStaffStore::new();
        let now = draft_with_code(&store, "d1", "111111").await;
        store
            .consume_otp_and_promote("d1", &hash_code("d1", "111111"), now, &verified("0001000001@classcify.in", now))
            .await
            .unwrap();

        let grant = OtpGrant::issue("d1", "222222", now, Duration::minutes(10));
        let late = store.put_otp("d1", grant, "2222222222", now).await;
        assert_matches!(late, Err(StoreError::StateConflict(_)));
        assert!(store.otp_grant("d1").await.is_none());
        let record = store.find_by_draft_id("d1").await.unwrap().unwrap();
        assert_eq!(record.professional.phone.as_deref(), Some("9999999999"));
    }

    #[tokio::test]
    async fn concurrent_verification_promotes_once() {
        let store = Arc::new(MemoryStaffStore::new());
        draft_with_code(&store, "d1", "111111").await;
        let code_hash = hash_code("d1", "111111");

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            let code_hash = code_hash.clone();
            handles.push(tokio::spawn(async move {
                let now = Utc::now();
                let next = verified(&format!("000{}000000@classcify.in", i), now);
                store.consume_otp_and_promote("d1", &code_hash, now, &next).await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn delete_clears_indexes() {
        let store = MemoryStaffStore::new();
        let now = draft_with_code(&store, "d1", "111111").await;
        let record = store
            .consume_otp_and_promote("d1", &hash_code("d1", "111111"), now, &verified("a@classcify.in", now))
            .await
            .unwrap();

        assert!(store.delete(record.id).await.unwrap());
        assert!(store.find_by_staff_id("a@classcify.in").await.unwrap().is_none());
        assert!(store.find_by_draft_id("d1").await.unwrap().is_none());
        assert!(!store.delete(record.id).await.unwrap());
    }
}
