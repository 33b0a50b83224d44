//! One-time phone verification codes.
//!
//! Only a SHA-256 digest of `draft_id:code` is stored, so a leaked grant row
//! can't be replayed against the verify endpoint.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};

pub const OTP_LENGTH: usize = 6;

/// Uniformly random 6-digit code without a leading zero.
pub fn generate_code() -> String {
    rand::rng().random_range(100_000u32..1_000_000).to_string()
}

pub fn hash_code(draft_id: &str, code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(draft_id.as_bytes());
    hasher.update(b":");
    hasher.update(code.trim().as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpGrant {
    pub code_hash: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl OtpGrant {
    pub fn issue(draft_id: &str, code: &str, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            code_hash: hash_code(draft_id, code),
            issued_at: now,
            expires_at: now + ttl,
        }
    }

    /// A code is valid strictly before its expiry instant.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn accepts(&self, code_hash: &str, now: DateTime<Utc>) -> bool {
        self.code_hash == code_hash && self.is_live_at(now)
    }
}

/// Local phone number without country code: 7 to 15 ASCII digits.
pub fn validate_phone(phone: &str) -> Result<(), String> {
    if phone.len() < 7 || phone.len() > 15 {
        return Err("Phone number must be 7 to 15 digits".to_string());
    }
    if !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err("Phone number may only contain digits".to_string());
    }
    Ok(())
}

pub fn otp_message(code: &str, ttl: Duration) -> String {
    format!("Your Classcify OTP: {} - Valid for {} minutes", code, ttl.num_minutes())
}
