//! Pass Generation — orchestrates the selection pipeline under a quality gate.
//!
//! Flow per attempt: select_candidates → select_with_ai →
//!       (Accepted | complete_selection | select_full) → quality check.
//!
//! Up to MAX_ATTEMPTS attempts run sequentially. The first attempt that meets
//! both quality targets is returned; otherwise the last non-empty attempt is.
//! Only a run in which every attempt selected nothing is an error.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::generation::ai_selection::{select_with_ai, AiOutcome};
use crate::generation::candidates::select_candidates;
use crate::generation::rule_based::{complete_selection, select_full};
use crate::generation::selection::{distinct_stores, summarize, Selection};
use crate::llm_client::TextGenerator;
use crate::models::pass::{value_ratio, Pass, SelectedBenefit, TierConfig, UserPreferences};
use crate::redemption::codes::redemption_code;

/// Upper bound on full pipeline runs per request.
pub const MAX_ATTEMPTS: u32 = 3;
/// `100 * total_value / price` a pass should reach.
pub const TARGET_VALUE_RATIO: f64 = 150.0;
pub const TARGET_AVG_SYNERGY: f64 = 70.0;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("The benefit catalog is empty")]
    EmptyCatalog,

    #[error("No eligible benefits could be selected after {attempts} attempts")]
    NoEligibleBenefits { attempts: u32 },
}

/// Time bounds for one generation request.
#[derive(Debug, Clone, Copy)]
pub struct GenerationLimits {
    /// Per-call bound on the text-generation service.
    pub llm_timeout: Duration,
    /// Whole-request deadline. No new attempt starts after it passes.
    pub deadline: Instant,
}

impl GenerationLimits {
    pub fn new(llm_timeout: Duration, request_budget: Duration) -> Self {
        Self {
            llm_timeout,
            deadline: Instant::now() + request_budget,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub pass: Pass,
    pub attempts: u32,
    pub quality_met: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Quality gate
// ────────────────────────────────────────────────────────────────────────────

/// Generates a pass for `prefs` from a catalog snapshot.
pub async fn generate_pass(
    catalog: &Catalog,
    generator: &dyn TextGenerator,
    prefs: &UserPreferences,
    limits: GenerationLimits,
) -> Result<GenerationReport, GenerationError> {
    let tier = prefs.tier.config();
    let mut last: Option<Vec<Selection<'_>>> = None;
    let mut attempts = 0;

    while attempts < MAX_ATTEMPTS {
        if attempts > 0 && Instant::now() >= limits.deadline {
            warn!("Generation deadline reached after {attempts} attempts, not retrying");
            break;
        }
        attempts += 1;

        let selections = run_attempt(catalog, generator, prefs, &tier, &limits).await?;
        if selections.is_empty() {
            warn!("Attempt {attempts}/{MAX_ATTEMPTS} selected no benefits");
            continue;
        }

        let summary = summarize(&selections);
        let ratio = value_ratio(summary.total_value, tier.price);
        info!(
            "Attempt {}/{}: {} benefits, value ratio {:.1}%, avg synergy {:.1}",
            attempts,
            MAX_ATTEMPTS,
            selections.len(),
            ratio,
            summary.avg_synergy
        );

        if meets_quality(ratio, summary.avg_synergy) {
            return Ok(GenerationReport {
                pass: build_pass(selections, prefs),
                attempts,
                quality_met: true,
            });
        }
        last = Some(selections);
    }

    let Some(selections) = last else {
        return Err(GenerationError::NoEligibleBenefits { attempts });
    };

    warn!(
        "Quality below target after {} attempts (targets: value ratio {}%, avg synergy {}), \
        returning last attempt",
        attempts, TARGET_VALUE_RATIO, TARGET_AVG_SYNERGY
    );
    Ok(GenerationReport {
        pass: build_pass(selections, prefs),
        attempts,
        quality_met: false,
    })
}

pub fn meets_quality(value_ratio: f64, avg_synergy: f64) -> bool {
    value_ratio >= TARGET_VALUE_RATIO && avg_synergy >= TARGET_AVG_SYNERGY
}

/// One full pipeline run: candidates, AI selection, rule-based fallback or top-up.
async fn run_attempt<'a>(
    catalog: &'a Catalog,
    generator: &dyn TextGenerator,
    prefs: &UserPreferences,
    tier: &TierConfig,
    limits: &GenerationLimits,
) -> Result<Vec<Selection<'a>>, GenerationError> {
    let candidates = select_candidates(catalog, &prefs.themes)?;
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let outcome = select_with_ai(
        catalog,
        &candidates,
        prefs,
        tier,
        generator,
        limits.llm_timeout,
        limits.deadline,
    )
    .await;

    let selections = match outcome {
        AiOutcome::Accepted(selections) => selections,
        AiOutcome::NeedsCompletion(partial) => {
            complete_selection(catalog, &prefs.themes, tier, partial)
        }
        AiOutcome::Fallback(reason) => {
            warn!("AI selection discarded ({reason}), using rule-based selection");
            select_full(catalog, &prefs.themes, tier)
        }
    };

    Ok(selections)
}

/// Freezes a selection into a `Pass`. Totals are recomputed from the selection
/// and every benefit gets its redemption code.
fn build_pass(selections: Vec<Selection<'_>>, prefs: &UserPreferences) -> Pass {
    let summary = summarize(&selections);
    let stores = distinct_stores(&selections).into_iter().cloned().collect();

    let selections = selections
        .into_iter()
        .map(|s| SelectedBenefit {
            redemption_code: redemption_code(s.benefit),
            benefit: s.benefit.clone(),
            store_name: s.store.name.clone(),
            reason: s.reason,
            source: s.source,
        })
        .collect();

    Pass {
        pass_id: Uuid::new_v4().to_string(),
        tier: prefs.tier,
        theme: prefs.themes.first().cloned(),
        user_id: prefs.user_id.clone(),
        stores,
        selections,
        total_value: summary.total_value,
        avg_synergy: summary.avg_synergy,
        created_at: Utc::now(),
        redemptions: BTreeMap::new(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
