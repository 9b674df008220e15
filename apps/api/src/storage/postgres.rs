//! PostgreSQL store.
//!
//! Passes are kept as JSONB documents keyed by pass id. The ledger is one row
//! per code, and the primary key on `code` is what makes a redemption
//! first-writer-wins: the conditional insert either claims the row or touches
//! nothing.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::{InsertOutcome, LedgerStore, PassStore, StoreError};
use crate::models::pass::Pass;
use crate::models::redemption::RedemptionRecord;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn find_redemption(&self, code: &str) -> Result<Option<RedemptionRecord>, StoreError> {
        Ok(sqlx::query_as::<_, RedemptionRecord>(
            "SELECT code, used_at, used_by, pass_id FROM redemptions WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn insert_redemption_if_absent(
        &self,
        record: RedemptionRecord,
    ) -> Result<InsertOutcome, StoreError> {
        let inserted = sqlx::query_as::<_, RedemptionRecord>(
            r#"
            INSERT INTO redemptions (code, used_at, used_by, pass_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (code) DO NOTHING
            RETURNING code, used_at, used_by, pass_id
            "#,
        )
        .bind(&record.code)
        .bind(record.used_at)
        .bind(&record.used_by)
        .bind(&record.pass_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok(InsertOutcome::Inserted(row));
        }

        debug!("Redemption for {} already recorded", record.code);
        let existing = self.find_redemption(&record.code).await?.ok_or_else(|| {
            StoreError::Inconsistent(format!(
                "insert for {} conflicted but no row was found",
                record.code
            ))
        })?;
        Ok(InsertOutcome::Existing(existing))
    }

    async fn redemptions_for_codes(
        &self,
        codes: &[String],
    ) -> Result<Vec<RedemptionRecord>, StoreError> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        Ok(sqlx::query_as::<_, RedemptionRecord>(
            "SELECT code, used_at, used_by, pass_id FROM redemptions WHERE code = ANY($1)",
        )
        .bind(codes)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[async_trait]
impl PassStore for PgStore {
    async fn put_pass(&self, pass: &Pass) -> Result<(), StoreError> {
        let document = serde_json::to_value(pass)?;

        sqlx::query(
            r#"
            INSERT INTO passes (pass_id, user_id, document, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (pass_id) DO UPDATE SET document = EXCLUDED.document
            "#,
        )
        .bind(&pass.pass_id)
        .bind(&pass.user_id)
        .bind(&document)
        .bind(pass.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_pass(&self, pass_id: &str) -> Result<Option<Pass>, StoreError> {
        let document: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT document FROM passes WHERE pass_id = $1")
                .bind(pass_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(document.map(serde_json::from_value).transpose()?)
    }

    async fn passes_for_user(&self, user_id: &str) -> Result<Vec<Pass>, StoreError> {
        let documents: Vec<serde_json::Value> = sqlx::query_scalar(
            "SELECT document FROM passes WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        documents
            .into_iter()
            .map(|d| serde_json::from_value(d).map_err(StoreError::from))
            .collect()
    }
}
