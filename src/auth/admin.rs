use super::password::verify_password;
use crate::config::AdminConfig;

#[derive(Debug, thiserror::Error)]
pub enum AdminAuthError {
    #[error("Admin login is not configured")]
    NotConfigured,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Stored admin hash is malformed: {0}")]
    MalformedHash(argon2::password_hash::Error),
}

/// The single school administrator, configured out of band.
#[derive(Debug, Clone, Default)]
pub struct AdminCredentials {
    email: Option<String>,
    password_hash: Option<String>,
}

impl AdminCredentials {
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            password_hash: Some(password_hash.into()),
        }
    }

    pub fn from_config(config: &AdminConfig) -> Self {
        Self {
            email: config.email.clone(),
            password_hash: config.password_hash.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.email.is_some() && self.password_hash.is_some()
    }

    /// Returns the admin email on success.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<&str, AdminAuthError> {
        let (Some(expected), Some(hash)) = (self.email.as_deref(), self.password_hash.as_deref()) else {
            return Err(AdminAuthError::NotConfigured);
        };

        // Verify the hash even when the email differs.
        let password_ok = verify_password(password, hash).map_err(AdminAuthError::MalformedHash)?;
        if password_ok && expected.eq_ignore_ascii_case(email.trim()) {
            Ok(expected)
        } else {
            Err(AdminAuthError::InvalidCredentials)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use assert_matches::assert_matches;

    #[test]
    fn authenticates_configured_admin() {
        let admin = AdminCredentials::new("admin@school.in", hash_password("s3cret").unwrap());
        assert_eq!(admin.authenticate("Admin@School.in", "s3cret").unwrap(), "admin@school.in");
        assert_matches!(admin.authenticate("admin@school.in", "nope"), Err(AdminAuthError::InvalidCredentials));
        assert_matches!(admin.authenticate("other@school.in", "s3cret"), Err(AdminAuthError::InvalidCredentials));
    }

    #[test]
    fn unconfigured_admin_cannot_log_in() {
        let admin = AdminCredentials::default();
        assert!(!admin.is_configured());
        assert_matches!(admin.authenticate("admin@school.in", "x"), Err(AdminAuthError::NotConfigured));
    }
}
