//! Offline scoring command

use std::path::Path;

use anyhow::{Context, Result};
use spendwatch_core::{DetectionOutcome, Detector, StaticHistory, Transaction};
use tracing::info;

use super::{load_config, read_transactions};

pub async fn cmd_score(
    config_path: Option<&Path>,
    history_path: &Path,
    new_path: &Path,
    seed: Option<u64>,
    user: Option<&str>,
    pretty: bool,
) -> Result<()> {
    let detector = Detector::new(load_config(config_path, seed)?);
    let history = read_transactions(history_path)?;
    let new = read_transactions(new_path)?;

    let outcome = score_transactions(&detector, history, new, user).await;
    info!(
        history = outcome.report.history_count,
        scored = outcome.report.scored_count,
        suspicious = outcome.report.suspicious_count,
        behavior = outcome.report.behavior_count,
        forest = outcome.report.forest_ran,
        "Scoring complete"
    );

    let json = if pretty {
        serde_json::to_string_pretty(&outcome.transactions)
    } else {
        serde_json::to_string(&outcome.transactions)
    }
    .context("Failed to serialize results")?;
    println!("{}", json);

    Ok(())
}

/// Score `new` against `history`.
///
/// With a user, only that user's history counts and the new transactions are
/// scored as theirs. Without one, the whole history file is the baseline.
pub async fn score_transactions(
    detector: &Detector,
    history: Vec<Transaction>,
    new: Vec<Transaction>,
    user: Option<&str>,
) -> DetectionOutcome {
    match user {
        Some(user_id) => {
            let new = new
                .into_iter()
                .map(|mut tx| {
                    tx.user_id = user_id.to_string();
                    tx
                })
                .collect();
            detector
                .detect_for_user(&StaticHistory::new(history), user_id, new)
                .await
        }
        None => {
            let mut history = history;
            history.sort_by(|a, b| b.date.cmp(&a.date));
            history.truncate(detector.config().history_window);
            detector.detect(&history, &new)
        }
    }
}
