use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::{DatabaseConfig, StorageBackend};
use crate::staff::store::StaffStore;

use super::memory::MemoryStaffStore;
use super::schema;
use super::staff_repository::PgStaffStore;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Postgres storage is not configured")]
    NotPostgres,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Builds the configured storage backend.
pub struct DatabaseManager;

impl DatabaseManager {
    /// Open a Postgres pool from the database settings.
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = config.url.as_deref().ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
        Self::validate_url(url)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Created database pool for: {}", Self::redacted(url)?);
        Ok(pool)
    }

    /// Open the backend named by the config, applying migrations for Postgres.
    pub async fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn StaffStore>, DatabaseError> {
        match config.backend {
            StorageBackend::Memory => {
                info!("Using in-memory staff store");
                Ok(Arc::new(MemoryStaffStore::new()))
            }
            StorageBackend::Postgres => {
                let pool = Self::connect(config).await?;
                schema::migrate(&pool).await?;
                Ok(Arc::new(PgStaffStore::new(pool)))
            }
        }
    }

    /// Apply the schema without starting the server.
    pub async fn migrate(config: &DatabaseConfig) -> Result<(), DatabaseError> {
        if config.backend != StorageBackend::Postgres {
            return Err(DatabaseError::NotPostgres);
        }
        let pool = Self::connect(config).await?;
        schema::migrate(&pool).await?;
        pool.close().await;
        Ok(())
    }

    fn validate_url(raw: &str) -> Result<url::Url, DatabaseError> {
        let url = url::Url::parse(raw).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        match url.scheme() {
            "postgres" | "postgresql" => Ok(url),
            _ => Err(DatabaseError::InvalidDatabaseUrl),
        }
    }

    /// Connection string with the password masked, for logs.
    pub fn redacted(raw: &str) -> Result<String, DatabaseError> {
        let mut url = Self::validate_url(raw)?;
        if url.password().is_some() {
            url.set_password(Some("***")).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        }
        Ok(url.into())
    }
}
