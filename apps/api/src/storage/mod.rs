//! Persistence for generated passes and the redemption ledger.
//!
//! `PgStore` is the durable backend. `MemoryStore` backs local runs without a
//! database and the test suite. Both make `insert_redemption_if_absent` an
//! atomic first-writer-wins operation.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::pass::Pass;
use crate::models::redemption::RedemptionRecord;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Inconsistent store state: {0}")]
    Inconsistent(String),
}

/// Result of a conditional ledger insert.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// The record passed in is now the ledger entry for its code.
    Inserted(RedemptionRecord),
    /// Another record already held the code; it is returned unchanged.
    Existing(RedemptionRecord),
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn find_redemption(&self, code: &str) -> Result<Option<RedemptionRecord>, StoreError>;

    /// Stores `record` only if no record exists for its code.
    async fn insert_redemption_if_absent(
        &self,
        record: RedemptionRecord,
    ) -> Result<InsertOutcome, StoreError>;

    /// Records for whichever of `codes` have been redeemed.
    async fn redemptions_for_codes(
        &self,
        codes: &[String],
    ) -> Result<Vec<RedemptionRecord>, StoreError>;
}

#[async_trait]
pub trait PassStore: Send + Sync {
    async fn put_pass(&self, pass: &Pass) -> Result<(), StoreError>;

    async fn get_pass(&self, pass_id: &str) -> Result<Option<Pass>, StoreError>;

    /// Newest first.
    async fn passes_for_user(&self, user_id: &str) -> Result<Vec<Pass>, StoreError>;
}
