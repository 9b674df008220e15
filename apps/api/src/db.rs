use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Tables are created on startup if missing; there is no separate migration step.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS passes (
        pass_id    TEXT PRIMARY KEY,
        user_id    TEXT,
        document   JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS passes_user_id_idx ON passes (user_id, created_at DESC)",
    r#"
    CREATE TABLE IF NOT EXISTS redemptions (
        code    TEXT PRIMARY KEY,
        used_at TIMESTAMPTZ NOT NULL,
        used_by TEXT,
        pass_id TEXT
    )
    "#,
];

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates the pass and redemption tables if they don't exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("Failed to apply database schema")?;
    }
    info!("Database schema ready");
    Ok(())
}
