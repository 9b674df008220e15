//! Redemption Ledger — validates codes and records one-time redemptions.
//!
//! A code is redeemable when the current catalog knows it. Redeeming is
//! idempotent: the first call creates the record, every later call (including
//! the loser of a concurrent race) gets that same record back.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::models::pass::Pass;
use crate::models::redemption::RedemptionRecord;
use crate::redemption::codes::normalize_code;
use crate::storage::{InsertOutcome, LedgerStore, StoreError};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Unknown redemption code: {0}")]
    UnknownCode(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a code grants, as shown at the counter.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BenefitInfo {
    pub benefit_id: String,
    pub store_id: String,
    pub store_name: String,
    pub area: String,
    pub description: String,
    pub benefit_type: String,
    pub eco_value: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub code: String,
    pub valid: bool,
    pub already_used: bool,
    pub benefit: Option<BenefitInfo>,
    /// Present once the code has been redeemed: when, and by whom.
    pub record: Option<RedemptionRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionOutcome {
    /// This call created the record.
    Redeemed,
    /// The code was already redeemed before this call started.
    AlreadyRedeemed,
    /// Another call redeemed the code while this one was in flight.
    ConcurrentReplay,
}

#[derive(Debug, Clone, Serialize)]
pub struct RedemptionResult {
    /// Always true: replays are accepted and surface the original record.
    pub accepted: bool,
    pub outcome: RedemptionOutcome,
    pub record: RedemptionRecord,
    pub benefit: Option<BenefitInfo>,
}

#[derive(Clone)]
pub struct RedemptionLedger {
    store: Arc<dyn LedgerStore>,
}

impl RedemptionLedger {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Read-only lookup. Unknown codes come back with `valid = false`.
    ///
    /// A code with a ledger record stays valid after its benefit leaves the
    /// catalog, so `already_used` can still be reported for it.
    pub async fn validate(
        &self,
        catalog: &Catalog,
        raw_code: &str,
    ) -> Result<ValidationResult, LedgerError> {
        let code = normalize_code(raw_code);
        if code.is_empty() {
            return Ok(ValidationResult {
                code,
                valid: false,
                already_used: false,
                benefit: None,
                record: None,
            });
        }

        let benefit = benefit_info(catalog, &code);
        let record = self.store.find_redemption(&code).await?;

        Ok(ValidationResult {
            valid: benefit.is_some() || record.is_some(),
            already_used: record.is_some(),
            code,
            benefit,
            record,
        })
    }

    /// Marks a code used. Idempotent; see the module docs.
    pub async fn redeem(
        &self,
        catalog: &Catalog,
        raw_code: &str,
        pass_id: Option<String>,
        user_id: Option<String>,
    ) -> Result<RedemptionResult, LedgerError> {
        let code = normalize_code(raw_code);
        let benefit = benefit_info(catalog, &code);

        if let Some(record) = self.store.find_redemption(&code).await? {
            info!("Code {code} replayed, originally redeemed at {}", record.used_at);
            return Ok(RedemptionResult {
                accepted: true,
                outcome: RedemptionOutcome::AlreadyRedeemed,
                record,
                benefit,
            });
        }

        if benefit.is_none() {
            return Err(LedgerError::UnknownCode(code));
        }

        let candidate = RedemptionRecord {
            code: code.clone(),
            used_at: Utc::now(),
            used_by: user_id.filter(|u| !u.trim().is_empty()),
            pass_id: pass_id.filter(|p| !p.trim().is_empty()),
        };

        let (outcome, record) = match self.store.insert_redemption_if_absent(candidate).await? {
            InsertOutcome::Inserted(record) => {
                info!(
                    "Code {} redeemed (pass {:?}, user {:?})",
                    record.code, record.pass_id, record.used_by
                );
                (RedemptionOutcome::Redeemed, record)
            }
            InsertOutcome::Existing(record) => {
                warn!("Code {code} was redeemed concurrently, returning the winning record");
                (RedemptionOutcome::ConcurrentReplay, record)
            }
        };

        Ok(RedemptionResult {
            accepted: true,
            outcome,
            record,
            benefit,
        })
    }

    /// Fills `pass.redemptions` from the ledger.
    pub async fn attach_redemptions(&self, pass: &mut Pass) -> Result<(), LedgerError> {
        let records = self
            .store
            .redemptions_for_codes(&pass.redemption_codes())
            .await?;
        pass.redemptions = records.into_iter().map(|r| (r.code, r.used_at)).collect();
        Ok(())
    }
}

fn benefit_info(catalog: &Catalog, code: &str) -> Option<BenefitInfo> {
    catalog.find_by_code(code).map(|(benefit, store)| BenefitInfo {
        benefit_id: benefit.id.clone(),
        store_id: store.id.clone(),
        store_name: store.name.clone(),
        area: store.area.clone(),
        description: benefit.description.clone(),
        benefit_type: benefit.benefit_type.clone(),
        eco_value: benefit.eco_value,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::catalog::fixtures::three_store_catalog;
    use crate::models::pass::{PassTier, SelectedBenefit, SelectionSource};
    use crate::redemption::codes::redemption_code;
    use crate::storage::MemoryStore;

    fn ledger() -> RedemptionLedger {
        RedemptionLedger::new(Arc::new(MemoryStore::new()))
    }

    fn code_for(catalog: &Catalog, benefit_id: &str) -> String {
        redemption_code(catalog.benefit(benefit_id).unwrap())
    }

    #[tokio::test]
    async fn test_unknown_code_is_invalid() {
        let catalog = three_store_catalog();
        let result = ledger().validate(&catalog, "ZZZZ").await.unwrap();
        assert!(!result.valid);
        assert!(!result.already_used);
        assert!(result.benefit.is_none());
    }

    #[tokio::test]
    async fn test_blank_code_is_invalid() {
        let catalog = three_store_catalog();
        let result = ledger().validate(&catalog, "   ").await.unwrap();
        assert!(!result.valid);
    }

    #[tokio::test]
    async fn test_validate_is_read_only() {
        let catalog = three_store_catalog();
        let ledger = ledger();
        let code = code_for(&catalog, "B1");

        for _ in 0..2 {
            let result = ledger.validate(&catalog, &code).await.unwrap();
            assert!(result.valid);
            assert!(!result.already_used);
            assert_eq!(result.benefit.unwrap().store_id, "S1");
        }
    }

    #[tokio::test]
    async fn test_redeem_unknown_code_rejected() {
        let catalog = three_store_catalog();
        let err = ledger()
            .redeem(&catalog, "ZZZZ", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnknownCode(code) if code == "ZZZZ"));
    }

    #[tokio::test]
    async fn test_redeem_is_idempotent() {
        let catalog = three_store_catalog();
        let ledger = ledger();
        let code = code_for(&catalog, "B2");

        let first = ledger
            .redeem(&catalog, &code, Some("P1".into()), Some("alice".into()))
            .await
            .unwrap();
        assert!(first.accepted);
        assert_eq!(first.outcome, RedemptionOutcome::Redeemed);
        assert_eq!(first.record.used_by.as_deref(), Some("alice"));

        let second = ledger
            .redeem(&catalog, &code, None, Some("mallory".into()))
            .await
            .unwrap();
        assert!(second.accepted);
        assert_eq!(second.outcome, RedemptionOutcome::AlreadyRedeemed);
        assert_eq!(second.record, first.record);

        let validation = ledger.validate(&catalog, &code).await.unwrap();
        assert!(validation.valid);
        assert!(validation.already_used);
        assert_eq!(validation.record, Some(first.record));
    }

    #[tokio::test]
    async fn test_used_code_stays_valid_after_catalog_drops_it() {
        let catalog = three_store_catalog();
        let ledger = ledger();
        let code = code_for(&catalog, "B1");
        ledger.redeem(&catalog, &code, None, None).await.unwrap();

        let empty = Catalog::new(vec![], vec![]);
        let result = ledger.validate(&empty, &code).await.unwrap();
        assert!(result.valid);
        assert!(result.already_used);
        assert!(result.benefit.is_none());
        assert!(result.record.is_some());
    }

    #[tokio::test]
    async fn test_codes_normalised_before_lookup() {
        let catalog = three_store_catalog();
        let ledger = ledger();
        let code = code_for(&catalog, "B3");

        let typed = format!("  {}  ", code.to_lowercase());
        let result = ledger.redeem(&catalog, &typed, None, None).await.unwrap();
        assert_eq!(result.record.code, code);
    }

    #[tokio::test]
    async fn test_blank_identifiers_not_recorded() {
        let catalog = three_store_catalog();
        let code = code_for(&catalog, "B1");
        let result = ledger()
            .redeem(&catalog, &code, Some(" ".into()), Some(String::new()))
            .await
            .unwrap();
        assert!(result.record.pass_id.is_none());
        assert!(result.record.used_by.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_redeems_create_one_record() {
        let catalog = Arc::new(three_store_catalog());
        let ledger = ledger();
        let code = code_for(&catalog, "B1");

        let handles: Vec<_> = (0..12)
            .map(|i| {
                let catalog = Arc::clone(&catalog);
                let ledger = ledger.clone();
                let code = code.clone();
                tokio::spawn(async move {
                    ledger
                        .redeem(&catalog, &code, None, Some(format!("user-{i}")))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        let created: Vec<_> = results
            .iter()
            .filter(|r| r.outcome == RedemptionOutcome::Redeemed)
            .collect();
        assert_eq!(created.len(), 1);
        assert!(results.iter().all(|r| r.accepted && r.record == created[0].record));

        let after = ledger.redeem(&catalog, &code, None, None).await.unwrap();
        assert_eq!(after.record, created[0].record);
    }

    #[tokio::test]
    async fn test_attach_redemptions_reflects_ledger() {
        let catalog = three_store_catalog();
        let ledger = ledger();

        let selections: Vec<SelectedBenefit> = ["B1", "B2"]
            .iter()
            .map(|id| {
                let benefit = catalog.benefit(id).unwrap().clone();
                SelectedBenefit {
                    redemption_code: redemption_code(&benefit),
                    store_name: String::new(),
                    reason: String::new(),
                    source: SelectionSource::RuleBased,
                    benefit,
                }
            })
            .collect();
        let mut pass = Pass {
            pass_id: "P1".to_string(),
            tier: PassTier::Citizen,
            theme: None,
            user_id: None,
            stores: vec![],
            selections,
            total_value: 9000,
            avg_synergy: 70.0,
            created_at: Utc::now(),
            redemptions: BTreeMap::new(),
        };

        let code = code_for(&catalog, "B2");
        let redeemed = ledger
            .redeem(&catalog, &code, Some("P1".into()), None)
            .await
            .unwrap();

        ledger.attach_redemptions(&mut pass).await.unwrap();
        assert_eq!(pass.redemptions.len(), 1);
        assert_eq!(pass.redemptions.get(&code), Some(&redeemed.record.used_at));
    }
}
