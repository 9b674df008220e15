//! AI Selection — asks the text-generation service to pick benefits from the
//! candidate list, then validates whatever comes back.
//!
//! Nothing in here returns an error to the caller. Service failures, timeouts,
//! unparsable output and constraint violations all become `AiOutcome::Fallback`,
//! and the caller switches to the rule-based selector.

use std::collections::HashSet;
use std::time::Duration;

use serde::{de, Deserialize, Deserializer};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::generation::candidates::ScoredBenefit;
use crate::generation::prompts::{
    COUNT_CONSTRAINT_TEMPLATE, SELECTION_PROMPT_TEMPLATE, SELECTION_SYSTEM,
    VALUE_CONSTRAINT_TEMPLATE,
};
use crate::generation::selection::{summarize, Selection};
use crate::llm_client::prompts::{GROUNDING_INSTRUCTION, JSON_ARRAY_ONLY_SYSTEM};
use crate::llm_client::{strip_json_fences, TextGenerator};
use crate::models::pass::{SelectionSource, TierCap, TierConfig, UserPreferences};

/// Accepted selections must average at least this store synergy.
pub const MIN_AVG_SYNERGY: f64 = 40.0;

const DEFAULT_AI_REASON: &str = "Recommended for your request.";

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// One entry of the service's JSON array.
#[derive(Debug, Clone, Deserialize)]
pub struct AiPick {
    #[serde(deserialize_with = "string_or_number")]
    pub benefit_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Why the AI result was discarded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FallbackReason {
    #[error("text-generation service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("no valid selections after validation")]
    NoValidSelections,

    #[error("average synergy {0:.1} below minimum")]
    LowSynergy(f64),
}

/// Result of one AI selection round.
#[derive(Debug)]
pub enum AiOutcome<'a> {
    /// Valid and meets the tier price: use as-is.
    Accepted(Vec<Selection<'a>>),
    /// Valid with adequate synergy but short of the tier price or, on count
    /// tiers, of the benefit count: keep these and let the rule-based selector
    /// top up.
    NeedsCompletion(Vec<Selection<'a>>),
    /// Discard entirely and run the rule-based selector from scratch.
    Fallback(FallbackReason),
}

// ────────────────────────────────────────────────────────────────────────────
// Protocol
// ────────────────────────────────────────────────────────────────────────────

/// Runs one AI selection round.
///
/// The service call is bounded by whichever comes first: `llm_timeout` from
/// now, or the request `deadline`.
pub async fn select_with_ai<'a>(
    catalog: &'a Catalog,
    candidates: &[ScoredBenefit<'a>],
    prefs: &UserPreferences,
    tier: &TierConfig,
    generator: &dyn TextGenerator,
    llm_timeout: Duration,
    deadline: Instant,
) -> AiOutcome<'a> {
    let prompt = build_selection_prompt(candidates, prefs, tier);
    let system = format!("{SELECTION_SYSTEM} {JSON_ARRAY_ONLY_SYSTEM}");
    let call_deadline = deadline.min(Instant::now() + llm_timeout);

    let text = match timeout_at(call_deadline, generator.complete(&prompt, &system)).await {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => return AiOutcome::Fallback(FallbackReason::ServiceUnavailable(e.to_string())),
        Err(_) => {
            return AiOutcome::Fallback(FallbackReason::ServiceUnavailable(
                "timed out waiting for a response".to_string(),
            ))
        }
    };

    let picks = match parse_picks(&text) {
        Ok(picks) => picks,
        Err(reason) => return AiOutcome::Fallback(reason),
    };
    debug!("AI returned {} picks", picks.len());

    let selections = validate_picks(catalog, &picks, tier);
    assess(selections, tier)
}

/// Fills the selection prompt with the tier constraint and candidate list.
pub fn build_selection_prompt(
    candidates: &[ScoredBenefit<'_>],
    prefs: &UserPreferences,
    tier: &TierConfig,
) -> String {
    let candidates_json = Value::Array(
        candidates
            .iter()
            .map(|c| {
                json!({
                    "benefit_id": c.benefit.id,
                    "store_name": c.store.name,
                    "description": c.benefit.description,
                    "eco_value": c.benefit.eco_value,
                    "store_themes": c.store.themes,
                })
            })
            .collect(),
    );

    let themes = if prefs.themes.is_empty() {
        "(none selected)".to_string()
    } else {
        prefs.themes.join(", ")
    };

    SELECTION_PROMPT_TEMPLATE
        .replace("{grounding_instruction}", GROUNDING_INSTRUCTION)
        .replace("{constraint}", &constraint_text(tier))
        .replace("{tier_name}", tier.name)
        .replace("{themes}", &themes)
        .replace("{request}", prefs.request.trim())
        .replace("{candidates_json}", &format!("{candidates_json:#}"))
}

fn constraint_text(tier: &TierConfig) -> String {
    match tier.cap {
        TierCap::MaxBenefits(count) => {
            COUNT_CONSTRAINT_TEMPLATE.replace("{count}", &count.to_string())
        }
        TierCap::ValueMultiple(_) => {
            let max_value = tier.value_cap().unwrap_or(tier.price);
            VALUE_CONSTRAINT_TEMPLATE
                .replace("{min_value}", &tier.price.to_string())
                .replace("{max_value}", &max_value.to_string())
        }
    }
}

/// Parses the service's reply into picks.
///
/// The reply must be a JSON array once code fences are stripped. Individual
/// entries that don't look like a pick are skipped.
pub fn parse_picks(text: &str) -> Result<Vec<AiPick>, FallbackReason> {
    let body = strip_json_fences(text);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| FallbackReason::MalformedResponse(format!("invalid JSON: {e}")))?;

    let Value::Array(entries) = value else {
        return Err(FallbackReason::MalformedResponse(
            "expected a JSON array".to_string(),
        ));
    };

    let picks = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<AiPick>(entry) {
            Ok(pick) => Some(pick),
            Err(e) => {
                warn!("Skipping malformed AI pick: {e}");
                None
            }
        })
        .collect();

    Ok(picks)
}

/// Keeps the picks that refer to eligible catalog benefits, in response order.
///
/// Ids are checked against the whole catalog, not only the candidates offered.
/// Repeated ids are ignored. Count tiers keep the first `max_benefits`; value
/// tiers stop at the first pick that would push the running total over the cap.
pub fn validate_picks<'a>(
    catalog: &'a Catalog,
    picks: &[AiPick],
    tier: &TierConfig,
) -> Vec<Selection<'a>> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut total_value: u32 = 0;
    let mut selections = Vec::new();

    for pick in picks {
        let Some((benefit, store)) = catalog.benefit_with_store(pick.benefit_id.trim()) else {
            warn!("AI referenced unknown benefit id {:?}, dropping", pick.benefit_id);
            continue;
        };
        if !seen.insert(benefit.id.as_str()) {
            continue;
        }

        if tier.max_benefits().is_some_and(|max| selections.len() >= max) {
            break;
        }
        if tier
            .value_cap()
            .is_some_and(|cap| total_value.saturating_add(benefit.eco_value) > cap)
        {
            break;
        }

        total_value = total_value.saturating_add(benefit.eco_value);
        let reason = pick
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_AI_REASON)
            .to_string();

        selections.push(Selection {
            benefit,
            store,
            reason,
            source: SelectionSource::Ai,
        });
    }

    selections
}

/// Post-validation quality checks.
pub fn assess<'a>(selections: Vec<Selection<'a>>, tier: &TierConfig) -> AiOutcome<'a> {
    if selections.is_empty() {
        return AiOutcome::Fallback(FallbackReason::NoValidSelections);
    }

    let summary = summarize(&selections);
    if summary.avg_synergy < MIN_AVG_SYNERGY {
        return AiOutcome::Fallback(FallbackReason::LowSynergy(summary.avg_synergy));
    }

    if summary.total_value < tier.price {
        info!(
            "AI selection worth {} is below the {} price {}, completing with rules",
            summary.total_value, tier.name, tier.price
        );
        return AiOutcome::NeedsCompletion(selections);
    }

    if let Some(max) = tier.max_benefits().filter(|&max| selections.len() < max) {
        info!(
            "AI selected {} of {} benefits for {}, completing with rules",
            selections.len(),
            max,
            tier.name
        );
        return AiOutcome::NeedsCompletion(selections);
    }

    AiOutcome::Accepted(selections)
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "benefit_id must be a string or number, got {other}"
        ))),
    }
}
