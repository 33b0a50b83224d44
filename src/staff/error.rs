use super::lifecycle::TransitionError;
use super::store::StoreError;
use crate::sms::SmsError;

/// Failures of the onboarding workflow, one variant per caller-visible class.
#[derive(Debug, thiserror::Error)]
pub enum StaffError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid or expired OTP")]
    InvalidCode,

    #[error("Failed to send OTP: {0}")]
    Delivery(#[from] SmsError),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Storage failure: {0}")]
    Persistence(String),

    /// Hashing or token signing failed.
    #[error("Internal failure: {0}")]
    Internal(String),
}

impl From<StoreError> for StaffError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => StaffError::NotFound(msg),
            StoreError::CodeRejected => StaffError::InvalidCode,
            StoreError::StateConflict(msg) => StaffError::Conflict(msg),
            StoreError::StaffIdTaken(id) => StaffError::Persistence(format!("staff id {} already taken", id)),
            StoreError::Corrupt(msg) => StaffError::Persistence(msg),
            StoreError::Sqlx(e) => StaffError::Persistence(e.to_string()),
        }
    }
}

impl From<crate::auth::JwtError> for StaffError {
    fn from(err: crate::auth::JwtError) -> Self {
        StaffError::Internal(err.to_string())
    }
}

impl From<argon2::password_hash::Error> for StaffError {
    fn from(err: argon2::password_hash::Error) -> Self {
        StaffError::Internal(format!("password hashing: {}", err))
    }
}

impl From<TransitionError> for StaffError {
    fn from(err: TransitionError) -> Self {
        StaffError::Conflict(err.to_string())
    }
}
