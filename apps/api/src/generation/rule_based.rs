//! Rule-based selector — deterministic fallback and top-up for pass generation.
//!
//! Algorithm:
//! 1. Rank every eligible benefit by preliminary score (stable, descending)
//! 2. Skip benefits already in the selection
//! 3. Greedily add until the tier cap is reached
//!    - count tiers stop at `max_benefits`
//!    - value tiers skip any benefit that would push the total over the cap and
//!      keep going with cheaper ones

use std::collections::HashSet;

use crate::catalog::Catalog;
use crate::generation::candidates::rank_benefits;
use crate::generation::selection::{summarize, Selection};
use crate::models::pass::{SelectionSource, TierConfig};

/// Builds a selection from scratch.
pub fn select_full<'a>(
    catalog: &'a Catalog,
    user_themes: &[String],
    tier: &TierConfig,
) -> Vec<Selection<'a>> {
    complete_selection(catalog, user_themes, tier, Vec::new())
}

/// Tops up a partial selection, keeping every entry already present.
pub fn complete_selection<'a>(
    catalog: &'a Catalog,
    user_themes: &[String],
    tier: &TierConfig,
    existing: Vec<Selection<'a>>,
) -> Vec<Selection<'a>> {
    let mut used: HashSet<&str> = existing.iter().map(|s| s.benefit.id.as_str()).collect();
    let mut total_value = summarize(&existing).total_value;
    let mut selections = existing;

    for candidate in rank_benefits(catalog, user_themes) {
        if used.contains(candidate.benefit.id.as_str()) {
            continue;
        }

        if tier.max_benefits().is_some_and(|max| selections.len() >= max) {
            break;
        }
        if tier
            .value_cap()
            .is_some_and(|cap| total_value.saturating_add(candidate.benefit.eco_value) > cap)
        {
            continue;
        }

        used.insert(candidate.benefit.id.as_str());
        total_value = total_value.saturating_add(candidate.benefit.eco_value);
        selections.push(Selection {
            benefit: candidate.benefit,
            store: candidate.store,
            reason: rule_reason(candidate.benefit.value, candidate.store.synergy),
            source: SelectionSource::RuleBased,
        });
    }

    selections
}

fn rule_reason(value: f64, synergy: u8) -> String {
    format!(
        "Chosen for its satisfaction score of {value:.0}/100 at a local store with a synergy score of {synergy}/100."
    )
}
