//! Fraud-alerts view over scored transactions

use crate::config::DetectionConfig;
use crate::models::{AlertReason, FraudAlert, Transaction};

/// Flags any amount above a fixed threshold, independent of history
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighAmountRule {
    pub threshold: f64,
}

impl HighAmountRule {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(config.high_amount_threshold)
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        tx.amount > self.threshold
    }
}

impl Default for HighAmountRule {
    fn default() -> Self {
        Self::from_config(&DetectionConfig::default())
    }
}

/// Every reason a transaction belongs in the alerts view
pub fn alert_reasons(tx: &Transaction, rule: &HighAmountRule) -> Vec<AlertReason> {
    let mut reasons = Vec::new();
    if tx.is_suspicious() {
        reasons.push(AlertReason::AnomalyScore);
    }
    if tx.behavior_flag() {
        reasons.push(AlertReason::Behavior);
    }
    if rule.matches(tx) {
        reasons.push(AlertReason::HighAmount);
    }
    reasons
}

/// One alert per transaction with at least one reason, newest first
pub fn build_alerts(transactions: &[Transaction], rule: &HighAmountRule) -> Vec<FraudAlert> {
    let mut alerts: Vec<FraudAlert> = transactions
        .iter()
        .filter_map(|tx| {
            let reasons = alert_reasons(tx, rule);
            if reasons.is_empty() {
                return None;
            }
            Some(FraudAlert {
                transaction_id: tx.id,
                user_id: tx.user_id.clone(),
                amount: tx.amount,
                category: tx.category.clone(),
                date: tx.date,
                anomaly_score: tx.anomaly_score,
                reasons,
            })
        })
        .collect();

    alerts.sort_by(|a, b| b.date.cmp(&a.date).then(b.transaction_id.cmp(&a.transaction_id)));
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{days_ago, tx, tx_for};

    #[test]
    fn test_high_amount_rule_is_strict() {
        let rule = HighAmountRule::default();
        assert_eq!(rule.threshold, 10_000.0);
        assert!(!rule.matches(&tx("Travel", 10_000.0)));
        assert!(rule.matches(&tx("Travel", 10_000.01)));
    }

    #[test]
    fn test_alert_reasons() {
        let rule = HighAmountRule::new(500.0);

        assert!(alert_reasons(&tx("Food", 20.0), &rule).is_empty());

        let both = tx("Food", 900.0).with_flags(0.8, true, true);
        assert_eq!(
            alert_reasons(&both, &rule),
            vec![
                AlertReason::AnomalyScore,
                AlertReason::Behavior,
                AlertReason::HighAmount
            ]
        );

        let behavior_only = tx("Food", 300.0).with_flags(0.4, false, true);
        assert_eq!(alert_reasons(&behavior_only, &rule), vec![AlertReason::Behavior]);
    }

    #[test]
    fn test_build_alerts_newest_first() {
        let rule = HighAmountRule::default();
        let mut older = tx_for("alice", "Food", 700.0, days_ago(5)).with_flags(0.7, true, false);
        older.id = 1;
        let mut quiet = tx_for("alice", "Food", 30.0, days_ago(3)).with_flags(0.3, false, false);
        quiet.id = 2;
        let mut newer = tx_for("alice", "Travel", 20_000.0, days_ago(1));
        newer.id = 3;

        let alerts = build_alerts(&[older, quiet, newer], &rule);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].transaction_id, 3);
        assert_eq!(alerts[0].reasons, vec![AlertReason::HighAmount]);
        assert_eq!(alerts[0].anomaly_score, None);
        assert_eq!(alerts[1].transaction_id, 1);
        assert_eq!(alerts[1].reasons, vec![AlertReason::AnomalyScore]);
    }
}
