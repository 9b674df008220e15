//! Candidate Selector — narrows the catalog to the top-K benefits by preliminary score.
//!
//! No LLM calls. The same ranking feeds the rule-based selector.

use crate::catalog::{Benefit, Catalog, Store};
use crate::generation::generator::GenerationError;
use crate::generation::scoring::{compute_preliminary_score, ScoringWeights};

/// Number of candidates offered to the AI selection step.
pub const CANDIDATE_LIMIT: usize = 20;

/// A benefit ranked by preliminary score.
#[derive(Debug, Clone)]
pub struct ScoredBenefit<'a> {
    pub benefit: &'a Benefit,
    pub store: &'a Store,
    pub score: f64,
}

/// Scores every eligible benefit and sorts descending.
///
/// The sort is stable: equal scores keep catalog order.
pub fn rank_benefits<'a>(catalog: &'a Catalog, user_themes: &[String]) -> Vec<ScoredBenefit<'a>> {
    let weights = ScoringWeights::default();

    let mut ranked: Vec<ScoredBenefit<'a>> = catalog
        .eligible()
        .map(|(benefit, store)| ScoredBenefit {
            benefit,
            store,
            score: compute_preliminary_score(benefit, store, user_themes, &weights),
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    ranked
}

/// Returns the top `CANDIDATE_LIMIT` benefits for the given themes.
pub fn select_candidates<'a>(
    catalog: &'a Catalog,
    user_themes: &[String],
) -> Result<Vec<ScoredBenefit<'a>>, GenerationError> {
    if catalog.is_empty() {
        return Err(GenerationError::EmptyCatalog);
    }

    let mut ranked = rank_benefits(catalog, user_themes);
    ranked.truncate(CANDIDATE_LIMIT);
    Ok(ranked)
}
