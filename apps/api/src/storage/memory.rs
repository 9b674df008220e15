//! In-memory store.
//!
//! DashMap-backed; used when no database is configured and in tests. Data does
//! not survive a restart.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{InsertOutcome, LedgerStore, PassStore, StoreError};
use crate::models::pass::Pass;
use crate::models::redemption::RedemptionRecord;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    passes: Arc<DashMap<String, Pass>>,
    redemptions: Arc<DashMap<String, RedemptionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn find_redemption(&self, code: &str) -> Result<Option<RedemptionRecord>, StoreError> {
        Ok(self.redemptions.get(code).map(|r| r.value().clone()))
    }

    async fn insert_redemption_if_absent(
        &self,
        record: RedemptionRecord,
    ) -> Result<InsertOutcome, StoreError> {
        // The entry guard holds the shard lock, so check-and-insert is atomic.
        match self.redemptions.entry(record.code.clone()) {
            Entry::Occupied(existing) => Ok(InsertOutcome::Existing(existing.get().clone())),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(InsertOutcome::Inserted(record))
            }
        }
    }

    async fn redemptions_for_codes(
        &self,
        codes: &[String],
    ) -> Result<Vec<RedemptionRecord>, StoreError> {
        Ok(codes
            .iter()
            .filter_map(|code| self.redemptions.get(code).map(|r| r.value().clone()))
            .collect())
    }
}

#[async_trait]
impl PassStore for MemoryStore {
    async fn put_pass(&self, pass: &Pass) -> Result<(), StoreError> {
        self.passes.insert(pass.pass_id.clone(), pass.clone());
        Ok(())
    }

    async fn get_pass(&self, pass_id: &str) -> Result<Option<Pass>, StoreError> {
        Ok(self.passes.get(pass_id).map(|p| p.value().clone()))
    }

    async fn passes_for_user(&self, user_id: &str) -> Result<Vec<Pass>, StoreError> {
        let mut passes: Vec<Pass> = self
            .passes
            .iter()
            .filter(|p| p.user_id.as_deref() == Some(user_id))
            .map(|p| p.value().clone())
            .collect();
        passes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(passes)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{Duration, Utc};

    use super::*;
    use crate::models::pass::PassTier;

    fn record(code: &str, user: &str) -> RedemptionRecord {
        RedemptionRecord {
            code: code.to_string(),
            used_at: Utc::now(),
            used_by: Some(user.to_string()),
            pass_id: None,
        }
    }

    fn pass(id: &str, user: Option<&str>, age_minutes: i64) -> Pass {
        Pass {
            pass_id: id.to_string(),
            tier: PassTier::Light,
            theme: None,
            user_id: user.map(str::to_string),
            stores: vec![],
            selections: vec![],
            total_value: 0,
            avg_synergy: 0.0,
            created_at: Utc::now() - Duration::minutes(age_minutes),
            redemptions: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_pass_round_trip_and_user_listing() {
        let store = MemoryStore::new();
        store.put_pass(&pass("P1", Some("u1"), 30)).await.unwrap();
        store.put_pass(&pass("P2", Some("u1"), 5)).await.unwrap();
        store.put_pass(&pass("P3", Some("u2"), 1)).await.unwrap();
        store.put_pass(&pass("P4", None, 1)).await.unwrap();

        assert_eq!(store.get_pass("P3").await.unwrap().unwrap().pass_id, "P3");
        assert!(store.get_pass("nope").await.unwrap().is_none());

        let ids: Vec<_> = store
            .passes_for_user("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.pass_id)
            .collect();
        assert_eq!(ids, vec!["P2", "P1"]);
    }

    #[tokio::test]
    async fn test_insert_if_absent_keeps_first_record() {
        let store = MemoryStore::new();
        let first = record("AAAA-BBBB", "alice");

        let outcome = store.insert_redemption_if_absent(first.clone()).await.unwrap();
        assert_eq!(outcome, InsertOutcome::Inserted(first.clone()));

        let outcome = store
            .insert_redemption_if_absent(record("AAAA-BBBB", "bob"))
            .await
            .unwrap();
        assert_eq!(outcome, InsertOutcome::Existing(first.clone()));
        assert_eq!(store.find_redemption("AAAA-BBBB").await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn test_redemptions_for_codes_skips_unredeemed() {
        let store = MemoryStore::new();
        store
            .insert_redemption_if_absent(record("AAAA-0001", "alice"))
            .await
            .unwrap();

        let found = store
            .redemptions_for_codes(&["AAAA-0001".to_string(), "AAAA-0002".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code, "AAAA-0001");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_have_one_winner() {
        let store = MemoryStore::new();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .insert_redemption_if_absent(record("RACE-0001", &format!("user-{i}")))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut winners = Vec::new();
        let mut observed = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                InsertOutcome::Inserted(r) => winners.push(r),
                InsertOutcome::Existing(r) => observed.push(r),
            }
        }

        assert_eq!(winners.len(), 1);
        assert!(observed.iter().all(|r| *r == winners[0]));
    }
}
