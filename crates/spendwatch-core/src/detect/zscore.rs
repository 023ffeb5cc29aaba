//! Behavioral analysis: how far an amount sits from its category baseline

use super::policy::HistoryPolicy;
use super::stats::{CategoryBaseline, CategoryStats};
use crate::models::Transaction;

/// Standard deviations from the baseline mean; 0 when the baseline has no spread
pub fn z_score(amount: f64, baseline: &CategoryBaseline) -> f64 {
    if baseline.std_dev == 0.0 {
        0.0
    } else {
        (amount - baseline.mean) / baseline.std_dev
    }
}

/// Flags transactions that deviate from a user's per-category baseline
pub struct BehaviorAnalyzer<'a> {
    stats: &'a CategoryStats,
    history_len: usize,
    z_threshold: f64,
    policy: HistoryPolicy,
}

impl<'a> BehaviorAnalyzer<'a> {
    pub fn new(
        stats: &'a CategoryStats,
        history_len: usize,
        z_threshold: f64,
        policy: HistoryPolicy,
    ) -> Self {
        Self {
            stats,
            history_len,
            z_threshold,
            policy,
        }
    }

    /// Whether the transaction's amount is out of character.
    ///
    /// With too little history only the fixed floor applies. Otherwise the
    /// transaction is flagged when `|z|` exceeds the threshold, or when its
    /// category has no baseline and the amount is above the floor.
    pub fn analyze(&self, tx: &Transaction) -> bool {
        if !self.policy.is_sufficient(self.history_len) {
            return self.policy.exceeds_floor(tx.amount);
        }

        let baseline = tx
            .category
            .as_deref()
            .map(|category| self.stats.get(category))
            .unwrap_or_default();

        if baseline.mean == 0.0 {
            return self.policy.exceeds_floor(tx.amount);
        }

        z_score(tx.amount, &baseline).abs() > self.z_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{history, normal_amounts, tx};

    fn analyzer(stats: &CategoryStats, history_len: usize) -> BehaviorAnalyzer<'_> {
        BehaviorAnalyzer::new(stats, history_len, 3.0, HistoryPolicy::default())
    }

    #[test]
    fn test_z_score() {
        let baseline = CategoryBaseline {
            mean: 100.0,
            std_dev: 10.0,
            count: 4,
        };
        assert_eq!(z_score(130.0, &baseline), 3.0);
        assert_eq!(z_score(80.0, &baseline), -2.0);

        let flat = CategoryBaseline {
            mean: 100.0,
            std_dev: 0.0,
            count: 3,
        };
        assert_eq!(z_score(1_000_000.0, &flat), 0.0);
    }

    #[test]
    fn test_flags_large_deviation() {
        let amounts = normal_amounts(500.0, 50.0, 100, 7);
        let past = history("Food", &amounts);
        let stats = CategoryStats::build(&past);

        let a = analyzer(&stats, past.len());
        assert!(a.analyze(&tx("Food", 5000.0)));
        assert!(!a.analyze(&tx("Food", 520.0)));
    }

    #[test]
    fn test_threshold_is_strict() {
        // mean 100, population std dev 10
        let past = history("Food", &[90.0, 110.0, 90.0, 110.0, 90.0, 110.0]);
        let stats = CategoryStats::build(&past);
        let a = analyzer(&stats, past.len());

        assert!(!a.analyze(&tx("Food", 130.0)));
        assert!(a.analyze(&tx("Food", 130.5)));
        // Deviation below the mean counts too
        assert!(a.analyze(&tx("Food", 69.0)));
    }

    #[test]
    fn test_unseen_category_uses_floor() {
        let past = history("Food", &[10.0, 11.0, 12.0, 13.0, 14.0]);
        let stats = CategoryStats::build(&past);
        let a = analyzer(&stats, past.len());

        assert!(!a.analyze(&tx("Travel", 900.0)));
        assert!(a.analyze(&tx("Travel", 1500.0)));

        let mut uncategorized = tx("Food", 2000.0);
        uncategorized.category = None;
        assert!(a.analyze(&uncategorized));
    }

    #[test]
    fn test_flat_baseline_never_flags_by_z() {
        let past = history("Bills", &[80.0; 6]);
        let stats = CategoryStats::build(&past);
        let a = analyzer(&stats, past.len());
        assert!(!a.analyze(&tx("Bills", 5000.0)));
    }

    #[test]
    fn test_thin_history_uses_floor_only() {
        let past = history("Food", &[10.0, 10.0, 10.0, 10.0]);
        let stats = CategoryStats::build(&past);
        let a = analyzer(&stats, past.len());

        // 50 would be far above the baseline, but four points are not enough
        assert!(!a.analyze(&tx("Food", 50.0)));
        assert!(!a.analyze(&tx("Food", 1000.0)));
        assert!(a.analyze(&tx("Food", 1000.5)));
    }
}
