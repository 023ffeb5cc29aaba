//! SpendWatch Core Library
//!
//! Per-user transaction anomaly detection:
//! - Feature encoding and per-category baselines
//! - Isolation-forest scoring (`isSuspicious`)
//! - Behavioral z-score analysis (`behaviorFlag`)
//! - Detection orchestration with history fetch and fallbacks
//! - Fraud-alerts view with a high-amount rule
//! - SQLite storage for transactions and persisted flags
//! - TOML configuration with documented defaults

pub mod alerts;
pub mod config;
pub mod db;
pub mod detect;
pub mod error;
pub mod history;
pub mod models;

/// Transaction fixtures for tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use alerts::{alert_reasons, build_alerts, HighAmountRule};
pub use config::DetectionConfig;
pub use db::Database;
pub use detect::{
    DetectError, DetectionOutcome, DetectionReport, DetectionStage, Detector, Fallback,
    ThresholdDirection,
};
pub use error::{Error, Result};
pub use history::{HistorySource, StaticHistory};
pub use models::{AlertReason, CategorySet, FraudAlert, NewTransaction, Transaction};
