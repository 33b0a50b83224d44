use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::lifecycle::{StaffState, StaffStatus};
use super::otp::OtpGrant;
use super::record::{StaffPatch, StaffRecord};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    /// No live grant matched the submitted code.
    #[error("No matching one-time code")]
    CodeRejected,

    #[error("Staff id already taken: {0}")]
    StaffIdTaken(String),

    /// The record was not in the state the caller expected.
    #[error("State conflict: {0}")]
    StateConflict(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Persistence for staff records and their short-lived OTP grants.
///
/// Each method is one atomic unit: implementations must not expose a state
/// where a grant was consumed but the record was not promoted, or the other
/// way around.
#[async_trait]
pub trait StaffStore: Send + Sync {
    /// Create the draft if `draft_id` is unknown, then merge `patch` into it.
    /// Fails with `StateConflict` when the record has left `Draft`.
    async fn upsert_draft(
        &self,
        draft_id: &str,
        patch: &StaffPatch,
        now: DateTime<Utc>,
    ) -> Result<StaffRecord, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<StaffRecord>, StoreError>;

    async fn find_by_draft_id(&self, draft_id: &str) -> Result<Option<StaffRecord>, StoreError>;

    async fn find_by_staff_id(&self, staff_id: &str) -> Result<Option<StaffRecord>, StoreError>;

    /// Replace the draft's grant and record the phone it was sent to.
    /// Fails with `StateConflict` when the record has left `Draft`.
    async fn put_otp(
        &self,
        draft_id: &str,
        grant: OtpGrant,
        phone: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Consume the grant iff it matches `code_hash` and is live at `now`, and
    /// move the still-`Draft` record to `next` in the same step.
    async fn consume_otp_and_promote(
        &self,
        draft_id: &str,
        code_hash: &str,
        now: DateTime<Utc>,
        next: &StaffState,
    ) -> Result<StaffRecord, StoreError>;

    /// Move a `Verified` record to `next` (`Active`). `StateConflict` if it
    /// was activated by someone else first.
    async fn activate(&self, id: Uuid, next: &StaffState, now: DateTime<Utc>) -> Result<StaffRecord, StoreError>;

    async fn record_login(&self, id: Uuid, now: DateTime<Utc>) -> Result<(), StoreError>;

    async fn list_by_status(&self, statuses: &[StaffStatus]) -> Result<Vec<StaffRecord>, StoreError>;

    /// Merge profile fields regardless of state.
    async fn update_profile(
        &self,
        id: Uuid,
        patch: &StaffPatch,
        now: DateTime<Utc>,
    ) -> Result<StaffRecord, StoreError>;

    /// Remove the record and any grant. Returns false if nothing was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
