use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{Benefit, Store};

/// Named pass configurations. Not user-editable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassTier {
    Light,
    Premium,
    Citizen,
}

/// How a tier bounds the benefits it includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "limit")]
pub enum TierCap {
    /// At most this many benefits.
    MaxBenefits(usize),
    /// Combined eco value at most `price * multiple`.
    ValueMultiple(u32),
}

#[derive(Debug, Clone, Serialize)]
pub struct TierConfig {
    pub tier: PassTier,
    pub name: &'static str,
    pub price: u32,
    pub cap: TierCap,
    pub description: &'static str,
}

impl TierConfig {
    pub fn max_benefits(&self) -> Option<usize> {
        match self.cap {
            TierCap::MaxBenefits(n) => Some(n),
            TierCap::ValueMultiple(_) => None,
        }
    }

    pub fn value_cap(&self) -> Option<u32> {
        match self.cap {
            TierCap::MaxBenefits(_) => None,
            TierCap::ValueMultiple(m) => Some(self.price.saturating_mul(m)),
        }
    }
}

impl PassTier {
    pub const ALL: [PassTier; 3] = [PassTier::Light, PassTier::Premium, PassTier::Citizen];

    pub fn config(self) -> TierConfig {
        match self {
            PassTier::Light => TierConfig {
                tier: self,
                name: "Light Pass",
                price: 7900,
                cap: TierCap::MaxBenefits(3),
                description: "Three hand-picked benefits for a short visit.",
            },
            PassTier::Premium => TierConfig {
                tier: self,
                name: "Premium Pass",
                price: 14900,
                cap: TierCap::ValueMultiple(2),
                description: "As many benefits as fit within twice the pass price.",
            },
            PassTier::Citizen => TierConfig {
                tier: self,
                name: "Citizen Pass",
                price: 6900,
                cap: TierCap::MaxBenefits(2),
                description: "Two neighbourhood benefits for local residents.",
            },
        }
    }

    /// Case-insensitive lookup by tier key.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "light" => Some(PassTier::Light),
            "premium" => Some(PassTier::Premium),
            "citizen" => Some(PassTier::Citizen),
            _ => None,
        }
    }
}

/// Inputs of one generation request. Built once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreferences {
    pub themes: Vec<String>,
    pub request: String,
    pub tier: PassTier,
    /// Always the tier price.
    pub budget: u32,
    pub user_id: Option<String>,
}

impl UserPreferences {
    pub fn new(
        themes: Vec<String>,
        request: String,
        tier: PassTier,
        user_id: Option<String>,
    ) -> Self {
        Self {
            themes,
            request,
            tier,
            budget: tier.config().price,
            user_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSource {
    Ai,
    RuleBased,
}

/// One benefit included in a pass, with the reason it was chosen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedBenefit {
    pub benefit: Benefit,
    pub store_name: String,
    pub reason: String,
    pub source: SelectionSource,
    pub redemption_code: String,
}

/// A generated pass.
///
/// `total_value` and `avg_synergy` are computed from `selections` when the pass is
/// assembled. `redemptions` is filled from the redemption ledger on read and is
/// never edited directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pass {
    pub pass_id: String,
    pub tier: PassTier,
    pub theme: Option<String>,
    pub user_id: Option<String>,
    pub stores: Vec<Store>,
    pub selections: Vec<SelectedBenefit>,
    pub total_value: u32,
    pub avg_synergy: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub redemptions: BTreeMap<String, DateTime<Utc>>,
}

impl Pass {
    /// `100 * total_value / price`
    pub fn value_ratio(&self) -> f64 {
        value_ratio(self.total_value, self.tier.config().price)
    }

    pub fn redemption_codes(&self) -> Vec<String> {
        self.selections
            .iter()
            .map(|s| s.redemption_code.clone())
            .collect()
    }
}

pub fn value_ratio(total_value: u32, price: u32) -> f64 {
    if price == 0 {
        return 0.0;
    }
    100.0 * total_value as f64 / price as f64
}
