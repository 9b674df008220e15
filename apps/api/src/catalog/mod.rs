//! Catalog — immutable snapshot of stores and benefits for generation and redemption.
//!
//! A `Catalog` is built once per load: store synergy is recomputed, missing benefit
//! ids are assigned, and lookup indexes (by store id, benefit id and redemption code)
//! are precomputed. `CatalogHandle` publishes the current snapshot behind an atomic
//! pointer so a reload is never observed half-applied.

pub mod handlers;
pub mod loader;
pub mod models;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::generation::scoring::store_synergy;
use crate::redemption::codes::redemption_code;

pub use loader::{CatalogError, CatalogProvider, JsonCatalogProvider};
pub use models::{Benefit, Store};

/// Summary of a loaded catalog, reported on startup and reload.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub stores: usize,
    pub benefits: usize,
    pub eligible_benefits: usize,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    stores: Vec<Store>,
    benefits: Vec<Benefit>,
    store_index: HashMap<String, usize>,
    benefit_index: HashMap<String, usize>,
    code_index: HashMap<String, usize>,
    loaded_at: DateTime<Utc>,
}

impl Catalog {
    pub fn new(mut stores: Vec<Store>, mut benefits: Vec<Benefit>) -> Self {
        let mut store_index = HashMap::with_capacity(stores.len());
        for (idx, store) in stores.iter_mut().enumerate() {
            store.synergy = store_synergy(store);
            if store_index.contains_key(&store.id) {
                warn!("Duplicate store id {} in catalog, keeping first", store.id);
                continue;
            }
            store_index.insert(store.id.clone(), idx);
        }

        let mut benefit_index = HashMap::with_capacity(benefits.len());
        let mut code_index = HashMap::with_capacity(benefits.len());
        for (idx, benefit) in benefits.iter_mut().enumerate() {
            if benefit.id.trim().is_empty() {
                benefit.id = format!("B{:03}", idx + 1);
            }
            benefit.value = benefit.value.clamp(0.0, 100.0);

            if benefit_index.contains_key(&benefit.id) {
                warn!("Duplicate benefit id {} in catalog, keeping first", benefit.id);
                continue;
            }
            benefit_index.insert(benefit.id.clone(), idx);

            if !store_index.contains_key(&benefit.store_id) {
                continue;
            }
            let code = redemption_code(benefit);
            if code_index.contains_key(&code) {
                warn!(
                    "Benefit {} shares redemption code {} with an earlier benefit, keeping first",
                    benefit.id, code
                );
                continue;
            }
            code_index.insert(code, idx);
        }

        Self {
            stores,
            benefits,
            store_index,
            benefit_index,
            code_index,
            loaded_at: Utc::now(),
        }
    }

    pub fn stores(&self) -> &[Store] {
        &self.stores
    }

    pub fn store(&self, store_id: &str) -> Option<&Store> {
        self.store_index.get(store_id).map(|&idx| &self.stores[idx])
    }

    pub fn benefit(&self, benefit_id: &str) -> Option<&Benefit> {
        self.benefit_index
            .get(benefit_id)
            .map(|&idx| &self.benefits[idx])
    }

    /// Looks up a benefit together with its owning store. `None` if either is missing.
    pub fn benefit_with_store(&self, benefit_id: &str) -> Option<(&Benefit, &Store)> {
        let benefit = self.benefit(benefit_id)?;
        let store = self.store(&benefit.store_id)?;
        Some((benefit, store))
    }

    /// Resolves a normalised redemption code to its benefit and store.
    pub fn find_by_code(&self, code: &str) -> Option<(&Benefit, &Store)> {
        let benefit = self.code_index.get(code).map(|&idx| &self.benefits[idx])?;
        let store = self.store(&benefit.store_id)?;
        Some((benefit, store))
    }

    /// Benefits whose owning store exists, in catalog order.
    pub fn eligible(&self) -> impl Iterator<Item = (&Benefit, &Store)> + '_ {
        self.benefits
            .iter()
            .enumerate()
            .filter(|(idx, b)| self.benefit_index.get(&b.id) == Some(idx))
            .filter_map(|(_, b)| self.store(&b.store_id).map(|s| (b, s)))
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty() || self.benefits.is_empty()
    }

    /// All theme tags carried by stores, sorted and de-duplicated.
    pub fn themes(&self) -> Vec<String> {
        self.stores
            .iter()
            .flat_map(|s| s.themes.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            stores: self.stores.len(),
            benefits: self.benefits.len(),
            eligible_benefits: self.eligible().count(),
            loaded_at: self.loaded_at,
        }
    }
}

/// Loads stores and benefits from a provider and builds a snapshot.
pub async fn load_catalog(provider: &dyn CatalogProvider) -> Result<Catalog, CatalogError> {
    let stores = provider.load_stores().await?;
    let benefits = provider.load_benefits().await?;
    Ok(Catalog::new(stores, benefits))
}

/// Shared, atomically swappable catalog snapshot.
pub struct CatalogHandle {
    current: ArcSwap<Catalog>,
    provider: Arc<dyn CatalogProvider>,
}

impl CatalogHandle {
    pub async fn load(provider: Arc<dyn CatalogProvider>) -> Result<Self, CatalogError> {
        let catalog = load_catalog(provider.as_ref()).await?;
        let stats = catalog.stats();
        info!(
            "Catalog loaded: {} stores, {} benefits ({} eligible)",
            stats.stores, stats.benefits, stats.eligible_benefits
        );
        Ok(Self {
            current: ArcSwap::from_pointee(catalog),
            provider,
        })
    }

    /// Returns the current snapshot. Readers keep their snapshot even if a
    /// reload swaps in a newer one mid-request.
    pub fn snapshot(&self) -> Arc<Catalog> {
        self.current.load_full()
    }

    /// Reloads from the provider. On failure the previous snapshot stays in place.
    pub async fn reload(&self) -> Result<CatalogStats, CatalogError> {
        let catalog = load_catalog(self.provider.as_ref()).await?;
        let stats = catalog.stats();
        self.current.store(Arc::new(catalog));
        info!(
            "Catalog reloaded: {} stores, {} benefits ({} eligible)",
            stats.stores, stats.benefits, stats.eligible_benefits
        );
        Ok(stats)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_synergy_recomputed_on_load() {
        let mut s = store("S1", 10, "", &[]);
        s.synergy = 3;
        let catalog = Catalog::new(vec![s], vec![]);
        assert_eq!(catalog.store("S1").unwrap().synergy, 80);
    }

    #[test]
    fn test_missing_benefit_ids_assigned_positionally() {
        let catalog = Catalog::new(
            vec![store("S1", 10, "", &[])],
            vec![benefit("", "S1", 50.0, 1000), benefit("", "S1", 60.0, 2000)],
        );
        assert!(catalog.benefit("B001").is_some());
        assert_eq!(catalog.benefit("B002").unwrap().eco_value, 2000);
    }

    #[test]
    fn test_benefit_value_clamped() {
        let catalog = Catalog::new(
            vec![store("S1", 10, "", &[])],
            vec![benefit("B1", "S1", 140.0, 1000)],
        );
        assert_eq!(catalog.benefit("B1").unwrap().value, 100.0);
    }

    #[test]
    fn test_orphan_benefits_not_eligible() {
        let catalog = Catalog::new(
            vec![store("S1", 10, "", &[])],
            vec![benefit("B1", "S1", 50.0, 1000), benefit("B2", "GONE", 50.0, 1000)],
        );
        let eligible: Vec<_> = catalog.eligible().map(|(b, _)| b.id.clone()).collect();
        assert_eq!(eligible, vec!["B1".to_string()]);
        assert!(catalog.benefit_with_store("B2").is_none());
    }

    #[test]
    fn test_duplicate_benefit_id_keeps_first() {
        let catalog = Catalog::new(
            vec![store("S1", 10, "", &[])],
            vec![benefit("B1", "S1", 50.0, 1000), benefit("B1", "S1", 50.0, 9000)],
        );
        assert_eq!(catalog.benefit("B1").unwrap().eco_value, 1000);
        assert_eq!(catalog.eligible().count(), 1);
    }

    #[test]
    fn test_code_lookup_resolves_benefit() {
        let catalog = three_store_catalog();
        let b2 = catalog.benefit("B2").unwrap().clone();
        let code = redemption_code(&b2);
        let (found, store) = catalog.find_by_code(&code).unwrap();
        assert_eq!(found.id, "B2");
        assert_eq!(store.id, "S2");
        assert!(catalog.find_by_code("ZZZZ").is_none());
    }

    #[test]
    fn test_themes_sorted_and_deduplicated() {
        let catalog = three_store_catalog();
        assert_eq!(catalog.themes(), vec!["cafe".to_string(), "food".to_string()]);
    }

    #[test]
    fn test_empty_catalog_detection() {
        assert!(Catalog::new(vec![], vec![]).is_empty());
        assert!(Catalog::new(vec![store("S1", 10, "", &[])], vec![]).is_empty());
        assert!(!three_store_catalog().is_empty());
    }
}
