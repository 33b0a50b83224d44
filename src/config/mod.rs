use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub otp: OtpConfig,
    pub sms: SmsConfig,
    pub staff: StaffConfig,
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

/// Where staff records live. `Memory` is only meant for local runs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    #[serde(skip_serializing)]
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_rate_limiting: bool,
    pub otp_rate_limit_requests: u32,
    pub otp_rate_limit_window_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpConfig {
    pub ttl_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    pub base_url: String,
    pub account_sid: Option<String>,
    #[serde(skip_serializing)]
    pub auth_token: Option<String>,
    pub from_number: Option<String>,
    pub country_code: String,
}

impl SmsConfig {
    /// True when every credential needed by the Twilio gateway is present.
    pub fn has_credentials(&self) -> bool {
        self.account_sid.is_some() && self.auth_token.is_some() && self.from_number.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffConfig {
    pub id_domain: String,
    pub max_id_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set outside development")]
    MissingJwtSecret,

    #[error("DATABASE_URL must be set when STORAGE_BACKEND=postgres")]
    MissingDatabaseUrl,

    #[error("SMS credentials (TWILIO_SID, TWILIO_AUTH_TOKEN, TWILIO_PHONE) are required in production")]
    MissingSmsCredentials,
}

const DEV_JWT_SECRET: &str = "classcify-development-secret";

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(v) = env::var("CLASSCIFY_API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Database overrides
        if let Ok(v) = env::var("STORAGE_BACKEND") {
            self.database.backend = match v.to_ascii_lowercase().as_str() {
                "postgres" | "pg" => StorageBackend::Postgres,
                "memory" | "mem" => StorageBackend::Memory,
                _ => self.database.backend,
            };
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_RATE_LIMITING") {
            self.api.enable_rate_limiting = v.parse().unwrap_or(self.api.enable_rate_limiting);
        }
        if let Ok(v) = env::var("API_OTP_RATE_LIMIT_REQUESTS") {
            self.api.otp_rate_limit_requests = v.parse().unwrap_or(self.api.otp_rate_limit_requests);
        }
        if let Ok(v) = env::var("API_OTP_RATE_LIMIT_WINDOW_SECS") {
            self.api.otp_rate_limit_window_secs = v.parse().unwrap_or(self.api.otp_rate_limit_window_secs);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        // OTP overrides
        if let Ok(v) = env::var("OTP_TTL_SECS") {
            self.otp.ttl_secs = v.parse().unwrap_or(self.otp.ttl_secs);
        }

        // SMS overrides
        if let Ok(v) = env::var("TWILIO_BASE_URL") {
            self.sms.base_url = v;
        }
        if let Ok(v) = env::var("TWILIO_SID") {
            self.sms.account_sid = Some(v);
        }
        if let Ok(v) = env::var("TWILIO_AUTH_TOKEN") {
            self.sms.auth_token = Some(v);
        }
        if let Ok(v) = env::var("TWILIO_PHONE") {
            self.sms.from_number = Some(v);
        }
        if let Ok(v) = env::var("SMS_COUNTRY_CODE") {
            self.sms.country_code = v;
        }

        // Staff overrides
        if let Ok(v) = env::var("STAFF_ID_DOMAIN") {
            self.staff.id_domain = v;
        }
        if let Ok(v) = env::var("STAFF_MAX_ID_ATTEMPTS") {
            self.staff.max_id_attempts = v.parse().unwrap_or(self.staff.max_id_attempts);
        }

        // Admin overrides
        if let Ok(v) = env::var("ADMIN_EMAIL") {
            self.admin.email = Some(v);
        }
        if let Ok(v) = env::var("ADMIN_PASSWORD_HASH") {
            self.admin.password_hash = Some(v);
        }

        self
    }

    /// Reject configurations that cannot run safely in the selected environment.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.environment != Environment::Development
            && (self.security.jwt_secret.is_empty() || self.security.jwt_secret == DEV_JWT_SECRET)
        {
            return Err(ConfigError::MissingJwtSecret);
        }
        if self.database.backend == StorageBackend::Postgres && self.database.url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        if self.environment == Environment::Production && !self.sms.has_credentials() {
            return Err(ConfigError::MissingSmsCredentials);
        }
        Ok(())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 5000 },
            database: DatabaseConfig {
                backend: StorageBackend::Memory,
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                otp_rate_limit_requests: 10,
                otp_rate_limit_window_secs: 15 * 60,
            },
            security: SecurityConfig {
                cors_origins: vec!["http://localhost:5173".to_string(), "http://127.0.0.1:5173".to_string()],
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
            },
            otp: OtpConfig { ttl_secs: 600 },
            sms: SmsConfig::unconfigured(),
            staff: StaffConfig::default_domain(),
            admin: AdminConfig { email: None, password_hash: None },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 5000 },
            database: DatabaseConfig {
                backend: StorageBackend::Postgres,
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                otp_rate_limit_requests: 10,
                otp_rate_limit_window_secs: 15 * 60,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://staging.classcify.in".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7,
            },
            otp: OtpConfig { ttl_secs: 600 },
            sms: SmsConfig::unconfigured(),
            staff: StaffConfig::default_domain(),
            admin: AdminConfig { email: None, password_hash: None },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 5000 },
            database: DatabaseConfig {
                backend: StorageBackend::Postgres,
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                otp_rate_limit_requests: 10,
                otp_rate_limit_window_secs: 15 * 60,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://app.classcify.in".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7,
            },
            otp: OtpConfig { ttl_secs: 600 },
            sms: SmsConfig::unconfigured(),
            staff: StaffConfig::default_domain(),
            admin: AdminConfig { email: None, password_hash: None },
        }
    }
}

impl SmsConfig {
    fn unconfigured() -> Self {
        Self {
            base_url: "https://api.twilio.com".to_string(),
            account_sid: None,
            auth_token: None,
            from_number: None,
            country_code: "+91".to_string(),
        }
    }
}

impl StaffConfig {
    fn default_domain() -> Self {
        Self {
            id_domain: "classcify.in".to_string(),
            max_id_attempts: 5,
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
