//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::io::Write;

use spendwatch_core::models::NewTransaction;
use spendwatch_core::test_utils::{days_ago, history, normal_amounts, tx, tx_for};
use spendwatch_core::{AlertReason, DetectionConfig, Detector, Fallback};
use tempfile::{NamedTempFile, TempDir};

use crate::commands::{self, list_alerts, render_config, score_transactions};

fn seeded_detector() -> Detector {
    Detector::new(DetectionConfig {
        seed: Some(11),
        ..Default::default()
    })
}

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

// ========== Score Command Tests ==========

#[tokio::test]
async fn test_score_whole_history_file() {
    let past = history("Food", &normal_amounts(500.0, 50.0, 100, 5));
    let new = vec![tx("Food", 5000.0), tx("Food", 505.0)];

    let outcome = score_transactions(&seeded_detector(), past, new, None).await;
    assert_eq!(outcome.report.history_count, 100);
    assert!(outcome.transactions[0].behavior_flag());
    assert!(outcome.transactions[0].is_suspicious());
    assert!(!outcome.transactions[1].behavior_flag());
}

#[tokio::test]
async fn test_score_for_one_user() {
    let mut past: Vec<_> = [100.0, 110.0, 95.0, 105.0, 120.0]
        .iter()
        .enumerate()
        .map(|(i, &a)| tx_for("alice", "Food", a, days_ago(i as i64 + 1)))
        .collect();
    past.push(tx_for("bob", "Food", 3.0, days_ago(1)));

    // New transactions without a user are scored as the selected user's
    let mut new = tx("Food", 1000.0);
    new.user_id = String::new();

    let outcome = score_transactions(&seeded_detector(), past, vec![new], Some("alice")).await;
    assert_eq!(outcome.report.history_count, 5);
    assert_eq!(outcome.transactions[0].user_id, "alice");
    assert!(outcome.transactions[0].behavior_flag());
}

#[tokio::test]
async fn test_score_thin_history_falls_back() {
    let past = history("Food", &[10.0, 12.0]);
    let outcome =
        score_transactions(&seeded_detector(), past, vec![tx("Food", 2000.0)], None).await;

    assert_eq!(outcome.report.fallback, Some(Fallback::InsufficientHistory));
    assert!(!outcome.transactions[0].is_suspicious());
    assert!(outcome.transactions[0].behavior_flag());
}

#[tokio::test]
async fn test_score_skips_non_positive_rows() {
    let mut past = history("Food", &[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
    past[0].amount = -1.0e308;
    let new = vec![tx("Food", 1.0e308), tx("Food", -5.0)];

    let outcome = score_transactions(&seeded_detector(), past, new, None).await;
    assert_eq!(outcome.report.history_count, 5);
    assert!(outcome.transactions[0].behavior_flag());
    assert!(!outcome.transactions[1].is_suspicious());
    assert!(!outcome.transactions[1].behavior_flag());
}

#[test]
fn test_read_transactions() {
    let file = write_temp(
        r#"[
            {"userId": "alice", "amount": 12.5, "category": "Food", "date": "2024-05-01T09:30:00Z"},
            {"amount": 40.0}
        ]"#,
    );

    let transactions = commands::read_transactions(file.path()).unwrap();
    assert_eq!(transactions.len(), 2);
    assert_eq!(transactions[0].user_id, "alice");
    assert_eq!(transactions[1].category, None);
}

#[test]
fn test_read_transactions_rejects_bad_json() {
    let file = write_temp(r#"{"amount": "lots"}"#);
    assert!(commands::read_transactions(file.path()).is_err());

    let missing = std::path::Path::new("/nonexistent/spendwatch/history.json");
    assert!(commands::read_transactions(missing).is_err());
}

#[tokio::test]
async fn test_cmd_score_end_to_end() {
    let past = serde_json::to_string(&history("Transport", &[20.0, 22.0, 21.0, 19.0, 20.5])).unwrap();
    let new = serde_json::to_string(&vec![tx("Transport", 900.0)]).unwrap();
    let history_file = write_temp(&past);
    let new_file = write_temp(&new);

    let result = commands::cmd_score(
        None,
        history_file.path(),
        new_file.path(),
        Some(3),
        None,
        false,
    )
    .await;
    assert!(result.is_ok());
}

// ========== Config Command Tests ==========

#[test]
fn test_load_config_seed_override() {
    let file = write_temp("[forest]\nseed = 5\ntree_count = 50\n");

    let config = commands::load_config(Some(file.path()), None).unwrap();
    assert_eq!(config.seed, Some(5));
    assert_eq!(config.tree_count, 50);

    let config = commands::load_config(Some(file.path()), Some(99)).unwrap();
    assert_eq!(config.seed, Some(99));
}

#[test]
fn test_render_config() {
    let file = write_temp("[behavior]\nz_threshold = 2.5\n");

    let rendered = render_config(Some(file.path())).unwrap();
    assert!(rendered.starts_with("# Effective detection config"));
    assert!(rendered.contains("z_threshold = 2.5"));
    assert!(rendered.contains("tree_count = 100"));
}

#[test]
fn test_invalid_config_is_an_error() {
    let file = write_temp("[forest]\ncontamination = 0.9\n");
    assert!(commands::load_config(Some(file.path()), None).is_err());

    let file = write_temp("[forest]\nunknown_key = 1\n");
    assert!(render_config(Some(file.path())).is_err());
}

// ========== Alerts Command Tests ==========

#[test]
fn test_alerts_from_database() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("alerts.db");
    let db = commands::open_db(&db_path).unwrap();

    let stored = db
        .insert_transaction(
            "alice",
            &NewTransaction {
                amount: 800.0,
                category: Some("Food".to_string()),
                description: None,
                date: Some(days_ago(2)),
            },
        )
        .unwrap();
    db.update_detection_flags(stored.id, &stored.clone().with_flags(0.72, true, true))
        .unwrap();

    db.insert_transaction(
        "alice",
        &NewTransaction {
            amount: 12_000.0,
            category: Some("Travel".to_string()),
            description: None,
            date: Some(days_ago(1)),
        },
    )
    .unwrap();

    let rule = spendwatch_core::HighAmountRule::default();
    let alerts = list_alerts(&db, "alice", &rule).unwrap();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].reasons, vec![AlertReason::HighAmount]);
    assert_eq!(
        alerts[1].reasons,
        vec![AlertReason::AnomalyScore, AlertReason::Behavior]
    );

    assert!(commands::cmd_alerts(&db_path, None, "alice").is_ok());
    assert!(commands::cmd_alerts(&db_path, None, "nobody").is_ok());
}
