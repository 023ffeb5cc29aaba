//! Domain models for SpendWatch

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Categories recognized by the feature encoder when no override is configured
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Food",
    "Transport",
    "Shopping",
    "Bills",
    "Entertainment",
    "Health",
    "Travel",
    "Education",
    "Other",
];

/// A spending transaction as owned by the surrounding application.
///
/// The detection fields are absent until a detection pass has run and are
/// written back by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Zero for transactions that have not been committed yet
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub user_id: String,
    /// Always positive; the direction of money is not modelled here
    pub amount: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "Utc::now")]
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Isolation forest score in `[0, 1]`. Set to 0.0 when the forest was
    /// skipped, which overlaps a strongly normal score; the detection report
    /// records which case applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_suspicious: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior_flag: Option<bool>,
}

impl Transaction {
    /// Create an unflagged transaction
    pub fn new(user_id: &str, amount: f64, category: Option<&str>, date: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            user_id: user_id.to_string(),
            amount,
            category: category.map(str::to_string),
            date,
            description: None,
            anomaly_score: None,
            is_suspicious: None,
            behavior_flag: None,
        }
    }

    /// Return a copy carrying the given detection results
    pub fn with_flags(mut self, anomaly_score: f64, is_suspicious: bool, behavior_flag: bool) -> Self {
        self.anomaly_score = Some(anomaly_score);
        self.is_suspicious = Some(is_suspicious);
        self.behavior_flag = Some(behavior_flag);
        self
    }

    pub fn is_suspicious(&self) -> bool {
        self.is_suspicious.unwrap_or(false)
    }

    pub fn behavior_flag(&self) -> bool {
        self.behavior_flag.unwrap_or(false)
    }
}

/// A transaction to be recorded (before DB insertion)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub amount: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to the insertion time
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// Ordered set of known spending categories.
///
/// The order fixes the layout of the one-hot segment in feature vectors.
/// Lookups ignore case and surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategorySet(Vec<String>);

impl CategorySet {
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(categories.into_iter().map(Into::into).collect())
    }

    /// Position of a category in the set, if known
    pub fn index_of(&self, category: &str) -> Option<usize> {
        let needle = category.trim();
        self.0.iter().position(|c| c.eq_ignore_ascii_case(needle))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for CategorySet {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORIES.iter().copied())
    }
}

/// Why a transaction shows up in the fraud-alerts view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertReason {
    /// Isolation forest marked it suspicious
    AnomalyScore,
    /// Amount deviates from the category baseline
    Behavior,
    /// Amount above the fixed high-amount threshold
    HighAmount,
}

impl AlertReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AnomalyScore => "anomaly_score",
            Self::Behavior => "behavior",
            Self::HighAmount => "high_amount",
        }
    }
}

impl std::str::FromStr for AlertReason {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anomaly_score" => Ok(Self::AnomalyScore),
            "behavior" => Ok(Self::Behavior),
            "high_amount" => Ok(Self::HighAmount),
            _ => Err(format!("Unknown alert reason: {}", s)),
        }
    }
}

impl std::fmt::Display for AlertReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An entry in a user's fraud-alerts view
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudAlert {
    pub transaction_id: i64,
    pub user_id: String,
    pub amount: f64,
    pub category: Option<String>,
    pub date: DateTime<Utc>,
    pub anomaly_score: Option<f64>,
    pub reasons: Vec<AlertReason>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_lookup_ignores_case() {
        let set = CategorySet::default();
        assert_eq!(set.index_of("Food"), Some(0));
        assert_eq!(set.index_of("  transport "), Some(1));
        assert_eq!(set.index_of("Crypto"), None);
        assert_eq!(set.len(), DEFAULT_CATEGORIES.len());
    }

    #[test]
    fn test_transaction_json_contract() {
        let json = r#"{"id": 7, "userId": "u1", "amount": 42.5, "category": "Food",
                       "date": "2024-03-01T12:00:00Z"}"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.user_id, "u1");
        assert_eq!(tx.category.as_deref(), Some("Food"));
        assert!(tx.anomaly_score.is_none());
        assert!(!tx.is_suspicious());

        let flagged = tx.with_flags(0.81, true, false);
        let value = serde_json::to_value(&flagged).unwrap();
        assert_eq!(value["anomalyScore"], 0.81);
        assert_eq!(value["isSuspicious"], true);
        assert_eq!(value["behaviorFlag"], false);
    }

    #[test]
    fn test_alert_reason_round_trip() {
        for reason in [
            AlertReason::AnomalyScore,
            AlertReason::Behavior,
            AlertReason::HighAmount,
        ] {
            assert_eq!(reason.as_str().parse::<AlertReason>().unwrap(), reason);
        }
        assert!("nope".parse::<AlertReason>().is_err());
    }
}
