use sqlx::PgPool;
use tracing::info;

use super::manager::DatabaseError;

/// Idempotent DDL, applied in order.
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "create staff",
        r#"
        CREATE TABLE IF NOT EXISTS staff (
            id            UUID PRIMARY KEY,
            draft_id      TEXT NOT NULL UNIQUE,
            status        TEXT NOT NULL DEFAULT 'draft'
                          CHECK (status IN ('draft', 'verified', 'active')),
            staff_id      TEXT UNIQUE,
            password_hash TEXT,
            personal      JSONB NOT NULL DEFAULT '{}'::jsonb,
            location      JSONB NOT NULL DEFAULT '{}'::jsonb,
            professional  JSONB NOT NULL DEFAULT '{}'::jsonb,
            verified_at   TIMESTAMPTZ,
            activated_at  TIMESTAMPTZ,
            created_at    TIMESTAMPTZ NOT NULL,
            updated_at    TIMESTAMPTZ NOT NULL,
            last_login_at TIMESTAMPTZ
        )
        "#,
    ),
    (
        "index staff status",
        "CREATE INDEX IF NOT EXISTS staff_status_idx ON staff (status, created_at DESC)",
    ),
    (
        "create staff_otp",
        r#"
        CREATE TABLE IF NOT EXISTS staff_otp (
            draft_id   TEXT PRIMARY KEY REFERENCES staff (draft_id) ON DELETE CASCADE,
            code_hash  TEXT NOT NULL,
            issued_at  TIMESTAMPTZ NOT NULL,
            expires_at TIMESTAMPTZ NOT NULL
        )
        "#,
    ),
];

pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
    for (name, sql) in MIGRATIONS {
        sqlx::query(sql).execute(pool).await?;
        info!("Applied migration: {}", name);
    }
    Ok(())
}
