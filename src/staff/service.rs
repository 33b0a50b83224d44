use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use super::error::StaffError;
use super::lifecycle::{StaffEvent, StaffState, StaffStatus};
use super::otp::{self, OtpGrant};
use super::record::{StaffPatch, StaffRecord};
use super::staff_id::StaffIdGenerator;
use super::store::{StaffStore, StoreError};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::{Role, TokenIssuer};
use crate::config::AppConfig;
use crate::sms::SmsGateway;

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub otp_ttl: Duration,
    pub country_code: String,
    pub staff_id_domain: String,
    pub max_id_attempts: u32,
}

impl ServiceSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            otp_ttl: Duration::seconds(config.otp.ttl_secs),
            country_code: config.sms.country_code.clone(),
            staff_id_domain: config.staff.id_domain.clone(),
            max_id_attempts: config.staff.max_id_attempts.max(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub record: StaffRecord,
    /// True when this login bootstrapped the password.
    pub activated: bool,
}

/// The onboarding workflow: draft, OTP, verification, first login.
pub struct StaffService {
    store: Arc<dyn StaffStore>,
    sms: Arc<dyn SmsGateway>,
    tokens: TokenIssuer,
    ids: StaffIdGenerator,
    settings: ServiceSettings,
}

impl StaffService {
    pub fn new(
        store: Arc<dyn StaffStore>,
        sms: Arc<dyn SmsGateway>,
        tokens: TokenIssuer,
        settings: ServiceSettings,
    ) -> Self {
        let ids = StaffIdGenerator::new(settings.staff_id_domain.clone());
        Self {
            store,
            sms,
            tokens,
            ids,
            settings,
        }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    pub async fn save_draft(&self, draft_id: Option<String>, patch: &StaffPatch) -> Result<String, StaffError> {
        let draft_id = match draft_id.filter(|id| !id.is_empty()) {
            Some(id) => {
                validate_draft_id(&id)?;
                id
            }
            None => Uuid::new_v4().to_string(),
        };

        let record = self.store.upsert_draft(&draft_id, patch, Utc::now()).await?;
        tracing::info!(draft_id = %record.draft_id, record_id = %record.id, "Draft saved");
        Ok(record.draft_id)
    }

    pub async fn get_draft(&self, draft_id: &str) -> Result<StaffRecord, StaffError> {
        self.store
            .find_by_draft_id(draft_id)
            .await?
            .ok_or_else(|| StaffError::NotFound("Draft not found".to_string()))
    }

    /// Send a fresh code and store it only once the provider accepted it.
    pub async fn issue_otp(&self, draft_id: &str, phone: &str) -> Result<(), StaffError> {
        otp::validate_phone(phone).map_err(StaffError::Validation)?;

        let record = self.get_draft(draft_id).await?;
        if record.status() != StaffStatus::Draft {
            return Err(StaffError::Conflict("Registration is already verified".to_string()));
        }

        let code = otp::generate_code();
        let to = format!("{}{}", self.settings.country_code, phone);
        if let Err(e) = self.sms.send(&to, &otp::otp_message(&code, self.settings.otp_ttl)).await {
            tracing::warn!(draft_id, error = %e, "OTP delivery failed");
            return Err(StaffError::Delivery(e));
        }

        let now = Utc::now();
        let grant = OtpGrant::issue(draft_id, &code, now, self.settings.otp_ttl);
        self.store.put_otp(draft_id, grant, phone, now).await?;

        tracing::info!(draft_id, "OTP issued");
        Ok(())
    }

    pub async fn verify_otp(&self, draft_id: &str, code: &str) -> Result<StaffRecord, StaffError> {
        let record = self.get_draft(draft_id).await?;
        let code_hash = otp::hash_code(draft_id, code);

        for attempt in 1..=self.settings.max_id_attempts {
            let now = Utc::now();
            let staff_id = self.ids.next_id();
            let next = record
                .state
                .apply(StaffEvent::OtpVerified {
                    staff_id: staff_id.clone(),
                    at: now,
                })
                .map_err(|_| StaffError::InvalidCode)?;

            match self.store.consume_otp_and_promote(draft_id, &code_hash, now, &next).await {
                Ok(updated) => {
                    tracing::info!(draft_id, staff_id = %staff_id, "Staff verified");
                    return Ok(updated);
                }
                Err(StoreError::StaffIdTaken(taken)) => {
                    tracing::warn!(attempt, staff_id = %taken, "Staff id collision, regenerating");
                }
                // Someone else verified first; the code is spent either way.
                Err(StoreError::StateConflict(_)) => return Err(StaffError::InvalidCode),
                Err(StoreError::CodeRejected) => {
                    tracing::debug!(draft_id, "OTP rejected");
                    return Err(StaffError::InvalidCode);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StaffError::Persistence("could not allocate a unique staff id".to_string()))
    }

    pub async fn login(&self, identifier: &str, password: Option<&str>) -> Result<LoginOutcome, StaffError> {
        let record = match self.store.find_by_staff_id(identifier).await? {
            Some(record) => record,
            None => {
                return match self.store.find_by_draft_id(identifier).await? {
                    Some(draft) if draft.status() == StaffStatus::Draft => {
                        Err(StaffError::Forbidden("Registration has not been verified".to_string()))
                    }
                    _ => Err(StaffError::NotFound("Staff member not found".to_string())),
                };
            }
        };

        let password = password.filter(|p| !p.is_empty());
        let (mut record, activated) = match record.state.clone() {
            StaffState::Draft => {
                return Err(StaffError::Forbidden("Registration has not been verified".to_string()));
            }
            StaffState::Verified { .. } => {
                let password = password
                    .ok_or_else(|| StaffError::BadRequest("Password is required to activate the account".to_string()))?;
                self.bootstrap_password(record, password).await?
            }
            StaffState::Active { password_hash, .. } => {
                let password = password.ok_or_else(|| StaffError::BadRequest("Password is required".to_string()))?;
                check_password(password, &password_hash)?;
                (record, false)
            }
        };

        let now = Utc::now();
        self.store.record_login(record.id, now).await?;
        record.last_login_at = Some(now);

        let staff_id = record
            .staff_id()
            .ok_or_else(|| StaffError::Internal("verified record without staff id".to_string()))?;
        let token = self.tokens.issue(staff_id, Some(record.id), Role::Teacher)?;

        tracing::info!(staff_id, activated, "Staff logged in");
        Ok(LoginOutcome {
            token,
            record,
            activated,
        })
    }

    async fn bootstrap_password(&self, record: StaffRecord, password: &str) -> Result<(StaffRecord, bool), StaffError> {
        let now = Utc::now();
        let next = record.state.apply(StaffEvent::PasswordBootstrapped {
            password_hash: hash_password(password)?,
            at: now,
        })?;

        match self.store.activate(record.id, &next, now).await {
            Ok(updated) => Ok((updated, true)),
            Err(StoreError::StateConflict(_)) => {
                // A concurrent first login won; authenticate against its password.
                let current = self.get_by_id(record.id).await?;
                match current.state.password_hash() {
                    Some(hash) => {
                        check_password(password, hash)?;
                        Ok((current, false))
                    }
                    None => Err(StaffError::Conflict("Account state changed, try again".to_string())),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<StaffRecord, StaffError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| StaffError::NotFound("Staff member not found".to_string()))
    }

    /// Classrooms assigned to a staff member.
    pub async fn courses(&self, id: Uuid) -> Result<Vec<String>, StaffError> {
        Ok(self.get_by_id(id).await?.classrooms().to_vec())
    }

    /// Verified and active staff, for the admin directory.
    pub async fn list_staff(&self) -> Result<Vec<StaffRecord>, StaffError> {
        Ok(self
            .store
            .list_by_status(&[StaffStatus::Verified, StaffStatus::Active])
            .await?)
    }

    pub async fn update_staff(&self, id: Uuid, patch: &StaffPatch) -> Result<StaffRecord, StaffError> {
        if patch.is_empty() {
            return Err(StaffError::Validation("Nothing to update".to_string()));
        }
        let record = self.store.update_profile(id, patch, Utc::now()).await?;
        tracing::info!(record_id = %id, "Staff profile updated");
        Ok(record)
    }

    pub async fn delete_staff(&self, id: Uuid) -> Result<(), StaffError> {
        if !self.store.delete(id).await? {
            return Err(StaffError::NotFound("Staff member not found".to_string()));
        }
        tracing::info!(record_id = %id, "Staff record deleted");
        Ok(())
    }

    pub async fn storage_health(&self) -> Result<(), StaffError> {
        Ok(self.store.ping().await?)
    }
}

fn check_password(password: &str, hash: &str) -> Result<(), StaffError> {
    if verify_password(password, hash)? {
        Ok(())
    } else {
        Err(StaffError::Unauthorized("Invalid credentials".to_string()))
    }
}

/// Client-supplied draft ids: 1 to 64 of `[A-Za-z0-9_-]`.
pub fn validate_draft_id(draft_id: &str) -> Result<(), StaffError> {
    if draft_id.is_empty() || draft_id.len() > 64 {
        return Err(StaffError::Validation("draftId must be 1 to 64 characters".to_string()));
    }
    if !draft_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(StaffError::Validation(
            "draftId may only contain letters, digits, '-' and '_'".to_string(),
        ));
    }
    Ok(())
}
