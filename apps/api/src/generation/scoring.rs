//! Scoring — deterministic synergy, theme match and preliminary benefit scores.
//!
//! Everything here is a pure function of its inputs.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::catalog::{Benefit, Store};

const BASE_SYNERGY: i32 = 50;
const FRANCHISE_PENALTY: i32 = 30;

/// Small-merchant alleys and traditional markets.
const ALLEY_MARKET_AREAS: &[&str] = &["신포동", "배다리", "송현시장"];
const ALLEY_MARKET_BONUS: i32 = 25;

/// Heritage quarter and waterfront.
const HERITAGE_AREAS: &[&str] = &["개항장", "월미도"];
const HERITAGE_BONUS: i32 = 5;

/// Station area, already saturated with foot traffic.
const TRANSIT_HUB_AREA: &str = "동인천역";
const TRANSIT_HUB_PENALTY: i32 = 15;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub benefit_value: f64,
    pub synergy: f64,
    pub theme_match: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            benefit_value: 0.4,
            synergy: 0.4,
            theme_match: 0.2,
        }
    }
}

/// Synergy score in [0, 100]: favours independent, under-reviewed stores in
/// priority areas.
pub fn compute_synergy_score(is_franchise: bool, review_count: u32, area: &str) -> u8 {
    let mut score = BASE_SYNERGY;

    if is_franchise {
        score -= FRANCHISE_PENALTY;
    }

    score += match review_count {
        0..=49 => 30,
        50..=99 => 20,
        100..=199 => 10,
        _ => -10,
    };

    score += area_bonus(area.trim());

    score.clamp(0, 100) as u8
}

pub fn store_synergy(store: &Store) -> u8 {
    compute_synergy_score(store.is_franchise, store.review_count, &store.area)
}

fn area_bonus(area: &str) -> i32 {
    if ALLEY_MARKET_AREAS.contains(&area) {
        ALLEY_MARKET_BONUS
    } else if HERITAGE_AREAS.contains(&area) {
        HERITAGE_BONUS
    } else if area == TRANSIT_HUB_AREA {
        -TRANSIT_HUB_PENALTY
    } else {
        0
    }
}

/// Percentage of the user's (distinct) themes the store carries. 0 when the
/// user picked no themes.
pub fn compute_theme_match(store: &Store, user_themes: &[String]) -> f64 {
    let wanted: HashSet<&str> = user_themes.iter().map(String::as_str).collect();
    if wanted.is_empty() {
        return 0.0;
    }

    let store_themes: HashSet<&str> = store.themes.iter().map(String::as_str).collect();
    let matched = wanted.intersection(&store_themes).count();

    100.0 * matched as f64 / wanted.len() as f64
}

/// Preliminary score: 0.4*value + 0.4*synergy + 0.2*theme_match
pub fn compute_preliminary_score(
    benefit: &Benefit,
    store: &Store,
    user_themes: &[String],
    weights: &ScoringWeights,
) -> f64 {
    weights.benefit_value * benefit.value
        + weights.synergy * store.synergy as f64
        + weights.theme_match * compute_theme_match(store, user_themes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{benefit, store};

    #[test]
    fn test_synergy_independent_few_reviews() {
        assert_eq!(compute_synergy_score(false, 10, ""), 80);
    }

    #[test]
    fn test_synergy_review_bands() {
        assert_eq!(compute_synergy_score(false, 49, ""), 80);
        assert_eq!(compute_synergy_score(false, 50, ""), 70);
        assert_eq!(compute_synergy_score(false, 99, ""), 70);
        assert_eq!(compute_synergy_score(false, 100, ""), 60);
        assert_eq!(compute_synergy_score(false, 199, ""), 60);
        assert_eq!(compute_synergy_score(false, 200, ""), 40);
    }

    #[test]
    fn test_synergy_franchise_penalty() {
        assert_eq!(compute_synergy_score(true, 500, ""), 10);
    }

    #[test]
    fn test_synergy_area_bonuses() {
        assert_eq!(compute_synergy_score(false, 500, "배다리"), 65);
        assert_eq!(compute_synergy_score(false, 500, "개항장"), 45);
        assert_eq!(compute_synergy_score(false, 500, "동인천역"), 25);
        assert_eq!(compute_synergy_score(false, 500, " 신포동 "), 65);
    }

    #[test]
    fn test_synergy_clamped_to_range() {
        assert_eq!(compute_synergy_score(false, 0, "송현시장"), 100);
        assert_eq!(compute_synergy_score(true, 10_000, "동인천역"), 0);
    }

    #[test]
    fn test_synergy_is_pure() {
        for reviews in [0, 75, 150, 5000] {
            for franchise in [false, true] {
                for area in ["", "월미도", "동인천역", "배다리"] {
                    let a = compute_synergy_score(franchise, reviews, area);
                    let b = compute_synergy_score(franchise, reviews, area);
                    assert_eq!(a, b);
                    assert!(a <= 100);
                }
            }
        }
    }

    #[test]
    fn test_theme_match_empty_user_themes() {
        let s = store("S1", 10, "", &["food"]);
        assert_eq!(compute_theme_match(&s, &[]), 0.0);
    }

    #[test]
    fn test_theme_match_partial_overlap() {
        let s = store("S1", 10, "", &["food", "retro"]);
        let themes = vec!["food".to_string(), "cafe".to_string()];
        assert!((compute_theme_match(&s, &themes) - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_theme_match_ignores_duplicate_user_themes() {
        let s = store("S1", 10, "", &["food"]);
        let themes = vec!["food".to_string(), "food".to_string()];
        assert_eq!(compute_theme_match(&s, &themes), 100.0);
    }

    #[test]
    fn test_preliminary_score_weights() {
        let mut s = store("S1", 10, "", &["food"]);
        s.synergy = 80;
        let b = benefit("B1", "S1", 60.0, 1000);
        let themes = vec!["food".to_string()];
        // 0.4*60 + 0.4*80 + 0.2*100 = 24 + 32 + 20 = 76
        let score = compute_preliminary_score(&b, &s, &themes, &ScoringWeights::default());
        assert!((score - 76.0).abs() < 1e-9, "Score was {score}");
    }
}
