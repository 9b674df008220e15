//! Working selection shared by the AI protocol and the rule-based selector.

use std::collections::HashSet;

use crate::catalog::{Benefit, Store};
use crate::models::pass::SelectionSource;

/// A benefit chosen for the pass being built. Borrows from the request's catalog
/// snapshot; cloned into the `Pass` only once the attempt is finished.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    pub benefit: &'a Benefit,
    pub store: &'a Store,
    pub reason: String,
    pub source: SelectionSource,
}

/// Aggregates recomputed from a selection list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionSummary {
    pub total_value: u32,
    /// Mean synergy over the distinct stores included. 0 for an empty selection.
    pub avg_synergy: f64,
}

pub fn summarize(selections: &[Selection<'_>]) -> SelectionSummary {
    let total_value = selections
        .iter()
        .fold(0u32, |acc, s| acc.saturating_add(s.benefit.eco_value));

    let stores = distinct_stores(selections);
    let avg_synergy = if stores.is_empty() {
        0.0
    } else {
        stores.iter().map(|s| s.synergy as f64).sum::<f64>() / stores.len() as f64
    };

    SelectionSummary {
        total_value,
        avg_synergy,
    }
}

/// Stores of the selection in first-appearance order.
pub fn distinct_stores<'a>(selections: &[Selection<'a>]) -> Vec<&'a Store> {
    let mut seen = HashSet::new();
    selections
        .iter()
        .filter(|s| seen.insert(s.store.id.as_str()))
        .map(|s| s.store)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::three_store_catalog;

    fn pick<'a>(catalog: &'a crate::catalog::Catalog, id: &str) -> Selection<'a> {
        let (benefit, store) = catalog.benefit_with_store(id).unwrap();
        Selection {
            benefit,
            store,
            reason: String::new(),
            source: SelectionSource::RuleBased,
        }
    }

    #[test]
    fn test_summary_of_empty_selection() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_value, 0);
        assert_eq!(summary.avg_synergy, 0.0);
    }

    #[test]
    fn test_summary_totals_and_mean_synergy() {
        let catalog = three_store_catalog();
        let selections = vec![pick(&catalog, "B1"), pick(&catalog, "B2")];
        let summary = summarize(&selections);
        assert_eq!(summary.total_value, 9000);
        assert!((summary.avg_synergy - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_mean_synergy_counts_each_store_once() {
        let catalog = crate::catalog::Catalog::new(
            vec![
                crate::catalog::fixtures::store("S1", 10, "", &[]),
                crate::catalog::fixtures::store("S2", 500, "", &[]),
            ],
            vec![
                crate::catalog::fixtures::benefit("B1", "S1", 50.0, 1000),
                crate::catalog::fixtures::benefit("B2", "S1", 50.0, 1000),
                crate::catalog::fixtures::benefit("B3", "S2", 50.0, 1000),
            ],
        );
        let selections = vec![pick(&catalog, "B1"), pick(&catalog, "B2"), pick(&catalog, "B3")];
        // stores: S1 (80) and S2 (40)
        assert!((summarize(&selections).avg_synergy - 60.0).abs() < 1e-9);
        assert_eq!(distinct_stores(&selections).len(), 2);
    }
}
