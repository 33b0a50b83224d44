//! Staff record lifecycle: `Draft -> Verified -> Active`.
//!
//! The state carries the data that only exists in that state (staff id,
//! password hash), so "verified but never logged in" and "active" can't be
//! confused. [`StaffState::apply`] is the only place a transition is decided.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffStatus {
    Draft,
    Verified,
    Active,
}

impl StaffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffStatus::Draft => "draft",
            StaffStatus::Verified => "verified",
            StaffStatus::Active => "active",
        }
    }
}

impl fmt::Display for StaffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StaffStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(StaffStatus::Draft),
            "verified" => Ok(StaffStatus::Verified),
            "active" => Ok(StaffStatus::Active),
            other => Err(format!("unknown staff status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaffState {
    Draft,
    Verified {
        staff_id: String,
        verified_at: DateTime<Utc>,
    },
    Active {
        staff_id: String,
        password_hash: String,
        verified_at: DateTime<Utc>,
        activated_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone)]
pub enum StaffEvent {
    /// The phone OTP was accepted and a staff id minted.
    OtpVerified { staff_id: String, at: DateTime<Utc> },
    /// First login stored a password.
    PasswordBootstrapped { password_hash: String, at: DateTime<Utc> },
}

impl StaffEvent {
    fn name(&self) -> &'static str {
        match self {
            StaffEvent::OtpVerified { .. } => "otp_verified",
            StaffEvent::PasswordBootstrapped { .. } => "password_bootstrapped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot apply {event} to a {from} record")]
pub struct TransitionError {
    pub from: StaffStatus,
    pub event: &'static str,
}

impl StaffState {
    pub fn status(&self) -> StaffStatus {
        match self {
            StaffState::Draft => StaffStatus::Draft,
            StaffState::Verified { .. } => StaffStatus::Verified,
            StaffState::Active { .. } => StaffStatus::Active,
        }
    }

    pub fn staff_id(&self) -> Option<&str> {
        match self {
            StaffState::Draft => None,
            StaffState::Verified { staff_id, .. } | StaffState::Active { staff_id, .. } => Some(staff_id),
        }
    }

    pub fn password_hash(&self) -> Option<&str> {
        match self {
            StaffState::Active { password_hash, .. } => Some(password_hash),
            _ => None,
        }
    }

    pub fn verified_at(&self) -> Option<DateTime<Utc>> {
        match self {
            StaffState::Draft => None,
            StaffState::Verified { verified_at, .. } | StaffState::Active { verified_at, .. } => Some(*verified_at),
        }
    }

    pub fn activated_at(&self) -> Option<DateTime<Utc>> {
        match self {
            StaffState::Active { activated_at, .. } => Some(*activated_at),
            _ => None,
        }
    }

    pub fn apply(&self, event: StaffEvent) -> Result<StaffState, TransitionError> {
        let name = event.name();
        match (self, event) {
            (StaffState::Draft, StaffEvent::OtpVerified { staff_id, at }) => Ok(StaffState::Verified {
                staff_id,
                verified_at: at,
            }),
            (
                StaffState::Verified { staff_id, verified_at },
                StaffEvent::PasswordBootstrapped { password_hash, at },
            ) => Ok(StaffState::Active {
                staff_id: staff_id.clone(),
                password_hash,
                verified_at: *verified_at,
                activated_at: at,
            }),
            (state, _) => Err(TransitionError {
                from: state.status(),
                event: name,
            }),
        }
    }

    /// Rebuild a state from its flattened storage columns.
    pub fn from_columns(
        status: StaffStatus,
        staff_id: Option<String>,
        password_hash: Option<String>,
        verified_at: Option<DateTime<Utc>>,
        activated_at: Option<DateTime<Utc>>,
    ) -> Result<Self, String> {
        match (status, staff_id, password_hash, verified_at, activated_at) {
            (StaffStatus::Draft, None, None, _, _) => Ok(StaffState::Draft),
            (StaffStatus::Verified, Some(staff_id), None, Some(verified_at), _) => {
                Ok(StaffState::Verified { staff_id, verified_at })
            }
            (StaffStatus::Active, Some(staff_id), Some(password_hash), Some(verified_at), Some(activated_at)) => {
                Ok(StaffState::Active {
                    staff_id,
                    password_hash,
                    verified_at,
                    activated_at,
                })
            }
            (status, ..) => Err(format!("inconsistent columns for a {} record", status)),
        }
    }
}
