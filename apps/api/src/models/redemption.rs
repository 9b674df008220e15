use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The single, immutable record of a code having been redeemed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RedemptionRecord {
    pub code: String,
    pub used_at: DateTime<Utc>,
    pub used_by: Option<String>,
    pub pass_id: Option<String>,
}
