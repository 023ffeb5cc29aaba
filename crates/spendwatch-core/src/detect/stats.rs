//! Per-category spending baselines

use std::collections::HashMap;

use serde::Serialize;

use crate::models::Transaction;

/// Mean, population standard deviation and count of one category's amounts
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBaseline {
    pub mean: f64,
    pub std_dev: f64,
    pub count: usize,
}

/// Baselines for every category present in a user's history.
///
/// Keys are normalized (trimmed, lowercase); lookups normalize the same way.
#[derive(Debug, Clone, Default)]
pub struct CategoryStats {
    by_category: HashMap<String, CategoryBaseline>,
}

impl CategoryStats {
    /// Group by category and compute mean and population standard deviation.
    ///
    /// Transactions without a category or with a non-numeric amount are skipped.
    pub fn build(transactions: &[Transaction]) -> Self {
        let mut amounts: HashMap<String, Vec<f64>> = HashMap::new();
        for tx in transactions {
            let Some(category) = tx.category.as_deref() else {
                continue;
            };
            if !tx.amount.is_finite() {
                continue;
            }
            amounts
                .entry(normalize(category))
                .or_default()
                .push(tx.amount);
        }

        let by_category = amounts
            .into_iter()
            .map(|(category, values)| (category, baseline(&values)))
            .collect();

        Self { by_category }
    }

    /// Baseline for a category; `{0, 0, 0}` when it has no history
    pub fn get(&self, category: &str) -> CategoryBaseline {
        self.by_category
            .get(&normalize(category))
            .copied()
            .unwrap_or_default()
    }

    pub fn contains(&self, category: &str) -> bool {
        self.by_category.contains_key(&normalize(category))
    }

    /// Number of categories with history
    pub fn len(&self) -> usize {
        self.by_category.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_category.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CategoryBaseline)> {
        self.by_category.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Convenience wrapper over [`CategoryStats::build`]
pub fn build_stats(transactions: &[Transaction]) -> CategoryStats {
    CategoryStats::build(transactions)
}

fn normalize(category: &str) -> String {
    category.trim().to_lowercase()
}

fn baseline(values: &[f64]) -> CategoryBaseline {
    let count = values.len();
    if count == 0 {
        return CategoryBaseline::default();
    }

    let n = count as f64;
    let mean = values.iter().sum::<f64>() / n;
    // Population variance, not Bessel-corrected
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    CategoryBaseline {
        mean,
        std_dev: variance.sqrt(),
        count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{history, tx};

    #[test]
    fn test_empty_history() {
        let stats = build_stats(&[]);
        assert!(stats.is_empty());
        assert_eq!(stats.get("Food"), CategoryBaseline::default());
    }

    #[test]
    fn test_single_transaction() {
        let stats = build_stats(&[tx("Food", 250.0)]);
        assert_eq!(stats.len(), 1);
        assert_eq!(
            stats.get("Food"),
            CategoryBaseline {
                mean: 250.0,
                std_dev: 0.0,
                count: 1
            }
        );
    }

    #[test]
    fn test_population_std_dev() {
        // mean 5, squared deviations sum to 32 over 8 values -> variance 4
        let stats = build_stats(&history("Food", &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]));
        let food = stats.get("Food");
        assert_eq!(food.count, 8);
        assert!((food.mean - 5.0).abs() < 1e-12);
        assert!((food.std_dev - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_groups_by_category() {
        let mut txs = history("Food", &[10.0, 20.0]);
        txs.extend(history("Transport", &[5.0]));
        txs.push(tx("  food ", 30.0));

        let stats = build_stats(&txs);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats.get("FOOD").count, 3);
        assert!((stats.get("Food").mean - 20.0).abs() < 1e-12);
        assert_eq!(stats.get("Transport").mean, 5.0);
        assert!(!stats.contains("Travel"));
    }

    #[test]
    fn test_skips_uncategorized_and_malformed() {
        let mut uncategorized = tx("Food", 99.0);
        uncategorized.category = None;
        let txs = vec![uncategorized, tx("Food", f64::NAN), tx("Food", 10.0)];

        let stats = build_stats(&txs);
        assert_eq!(stats.get("Food").count, 1);
        assert_eq!(stats.get("Food").mean, 10.0);
    }
}
