//! Insufficient-history policy shared by both analyzers

use crate::config::DetectionConfig;

/// When history is too thin for statistics, flag only amounts above a fixed floor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryPolicy {
    pub min_history: usize,
    pub fallback_floor: f64,
}

impl HistoryPolicy {
    pub fn from_config(config: &DetectionConfig) -> Self {
        Self {
            min_history: config.min_history,
            fallback_floor: config.fallback_floor,
        }
    }

    /// The minimum is inclusive: exactly `min_history` transactions is enough
    pub fn is_sufficient(&self, history_len: usize) -> bool {
        history_len >= self.min_history
    }

    pub fn exceeds_floor(&self, amount: f64) -> bool {
        amount > self.fallback_floor
    }
}

impl Default for HistoryPolicy {
    fn default() -> Self {
        Self::from_config(&DetectionConfig::default())
    }
}
