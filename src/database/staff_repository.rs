use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::staff::lifecycle::{StaffState, StaffStatus};
use crate::staff::otp::OtpGrant;
use crate::staff::record::{LocationInfo, PersonalInfo, ProfessionalInfo, StaffPatch, StaffRecord};
use crate::staff::store::{StaffStore, StoreError};

const STAFF_COLUMNS: &str = "id, draft_id, status, staff_id, password_hash, personal, location, professional, \
     verified_at, activated_at, created_at, updated_at, last_login_at";

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, FromRow)]
struct StaffRow {
    id: Uuid,
    draft_id: String,
    status: String,
    staff_id: Option<String>,
    password_hash: Option<String>,
    personal: Json<PersonalInfo>,
    location: Json<LocationInfo>,
    professional: Json<ProfessionalInfo>,
    verified_at: Option<DateTime<Utc>>,
    activated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_login_at: Option<DateTime<Utc>>,
}

impl TryFrom<StaffRow> for StaffRecord {
    type Error = StoreError;

    fn try_from(row: StaffRow) -> Result<Self, Self::Error> {
        let status: StaffStatus = row.status.parse().map_err(StoreError::Corrupt)?;
        let state = StaffState::from_columns(
            status,
            row.staff_id,
            row.password_hash,
            row.verified_at,
            row.activated_at,
        )
        .map_err(|e| StoreError::Corrupt(format!("{}: {}", row.id, e)))?;

        Ok(StaffRecord {
            id: row.id,
            draft_id: row.draft_id,
            state,
            personal: row.personal.0,
            location: row.location.0,
            professional: row.professional.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_login_at: row.last_login_at,
        })
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

/// Postgres-backed [`StaffStore`]. Multi-step operations run in one
/// transaction with the staff row locked.
#[derive(Clone)]
pub struct PgStaffStore {
    pool: PgPool,
}

impl PgStaffStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lock_by_draft(
        tx: &mut Transaction<'_, Postgres>,
        draft_id: &str,
    ) -> Result<Option<StaffRecord>, StoreError> {
        let row: Option<StaffRow> =
            sqlx::query_as(&format!("SELECT {} FROM staff WHERE draft_id = $1 FOR UPDATE", STAFF_COLUMNS))
                .bind(draft_id)
                .fetch_optional(&mut **tx)
                .await?;
        row.map(StaffRecord::try_from).transpose()
    }

    async fn lock_by_id(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> Result<Option<StaffRecord>, StoreError> {
        let row: Option<StaffRow> =
            sqlx::query_as(&format!("SELECT {} FROM staff WHERE id = $1 FOR UPDATE", STAFF_COLUMNS))
                .bind(id)
                .fetch_optional(&mut **tx)
                .await?;
        row.map(StaffRecord::try_from).transpose()
    }

    async fn write_profile(tx: &mut Transaction<'_, Postgres>, record: &StaffRecord) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE staff SET personal = $2, location = $3, professional = $4, updated_at = $5 WHERE id = $1",
        )
        .bind(record.id)
        .bind(Json(&record.personal))
        .bind(Json(&record.location))
        .bind(Json(&record.professional))
        .bind(record.updated_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn fetch_one_where(&self, column: &str, value: &str) -> Result<Option<StaffRecord>, StoreError> {
        let row: Option<StaffRow> =
            sqlx::query_as(&format!("SELECT {} FROM staff WHERE {} = $1", STAFF_COLUMNS, column))
                .bind(value)
                .fetch_optional(&self.pool)
                .await?;
        row.map(StaffRecord::try_from).transpose()
    }
}

#[async_trait]
impl StaffStore for PgStaffStore {
    async fn upsert_draft(
        &self,
        draft_id: &str,
        patch: &StaffPatch,
        now: DateTime<Utc>,
    ) -> Result<StaffRecord, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO staff (id, draft_id, status, created_at, updated_at) \
             VALUES ($1, $2, 'draft', $3, $3) ON CONFLICT (draft_id) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(draft_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let mut record = Self::lock_by_draft(&mut tx, draft_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(draft_id.to_string()))?;
        if record.status() != StaffStatus::Draft {
            return Err(StoreError::StateConflict(format!(
                "registration {} is already {}",
                draft_id,
                record.status()
            )));
        }

        record.apply_patch(patch, now);
        Self::write_profile(&mut tx, &record).await?;
        tx.commit().await?;
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<StaffRecord>, StoreError> {
        let row: Option<StaffRow> = sqlx::query_as(&format!("SELECT {} FROM staff WHERE id = $1", STAFF_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(StaffRecord::try_from).transpose()
    }

    async fn find_by_draft_id(&self, draft_id: &str) -> Result<Option<StaffRecord>, StoreError> {
        self.fetch_one_where("draft_id", draft_id).await
    }

    async fn find_by_staff_id(&self, staff_id: &str) -> Result<Option<StaffRecord>, StoreError> {
        self.fetch_one_where("staff_id", staff_id).await
    }

    async fn put_otp(
        &self,
        draft_id: &str,
        grant: OtpGrant,
        phone: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let mut record = Self::lock_by_draft(&mut tx, draft_id)
            .await?
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
        Self::write_profile(&mut tx, &record).await?;

        sqlx::query(
            "INSERT INTO staff_otp (draft_id, code_hash, issued_at, expires_at) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (draft_id) DO UPDATE SET code_hash = EXCLUDED.code_hash, \
             issued_at = EXCLUDED.issued_at, expires_at = EXCLUDED.expires_at",
        )
        .bind(draft_id)
        .bind(&grant.code_hash)
        .bind(grant.issued_at)
        .bind(grant.expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn consume_otp_and_promote(
        &self,
        draft_id: &str,
        code_hash: &str,
        now: DateTime<Utc>,
        next: &StaffState,
    ) -> Result<StaffRecord, StoreError> {
        let StaffState::Verified { staff_id, verified_at } = next else {
            return Err(StoreError::StateConflict("promotion target must be verified".to_string()));
        };

        let mut tx = self.pool.begin().await?;

        // Conditional delete is the compare-and-clear: at most one caller gets the row.
        let consumed: Option<(String,)> = sqlx::query_as(
            "DELETE FROM staff_otp WHERE draft_id = $1 AND code_hash = $2 AND expires_at > $3 RETURNING draft_id",
        )
        .bind(draft_id)
        .bind(code_hash)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;
        if consumed.is_none() {
            return Err(StoreError::CodeRejected);
        }

        let promoted = sqlx::query_as::<_, StaffRow>(&format!(
            "UPDATE staff SET status = 'verified', staff_id = $2, verified_at = $3, updated_at = $4 \
             WHERE draft_id = $1 AND status = 'draft' RETURNING {}",
            STAFF_COLUMNS
        ))
        .bind(draft_id)
        .bind(staff_id)
        .bind(verified_at)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await;

        let row = match promoted {
            Ok(Some(row)) => row,
            Ok(None) => return Err(StoreError::StateConflict(format!("{} is no longer a draft", draft_id))),
            Err(e) if is_unique_violation(&e) => return Err(StoreError::StaffIdTaken(staff_id.clone())),
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;
        StaffRecord::try_from(row)
    }

    async fn activate(&self, id: Uuid, next: &StaffState, now: DateTime<Utc>) -> Result<StaffRecord, StoreError> {
        let StaffState::Active {
            password_hash,
            activated_at,
            ..
        } = next
        else {
            return Err(StoreError::StateConflict("activation target must be active".to_string()));
        };

        let row: Option<StaffRow> = sqlx::query_as(&format!(
            "UPDATE staff SET status = 'active', password_hash = $2, activated_at = $3, updated_at = $4 \
             WHERE id = $1 AND status = 'verified' RETURNING {}",
            STAFF_COLUMNS
        ))
        .bind(id)
        .bind(password_hash)
        .bind(activated_at)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => StaffRecord::try_from(row),
            None => match self.find_by_id(id).await? {
                Some(current) => Err(StoreError::StateConflict(format!("{} is {}", id, current.status()))),
                None => Err(StoreError::NotFound(id.to_string())),
            },
        }
    }

    async fn record_login(&self, id: Uuid, now: DateTime<Utc>) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE staff SET last_login_at = $2 WHERE id = $1")
            .bind(id)
            .bind(now)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn list_by_status(&self, statuses: &[StaffStatus]) -> Result<Vec<StaffRecord>, StoreError> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
        let rows: Vec<StaffRow> = sqlx::query_as(&format!(
            "SELECT {} FROM staff WHERE status = ANY($1) ORDER BY created_at DESC",
            STAFF_COLUMNS
        ))
        .bind(&statuses)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(StaffRecord::try_from).collect()
    }

    async fn update_profile(
        &self,
        id: Uuid,
        patch: &StaffPatch,
        now: DateTime<Utc>,
    ) -> Result<StaffRecord, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut record = Self::lock_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.apply_patch(patch, now);
        Self::write_profile(&mut tx, &record).await?;
        tx.commit().await?;
        Ok(record)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM staff WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
