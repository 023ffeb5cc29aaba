//! Fraud alerts command

use std::path::Path;

use anyhow::Result;
use spendwatch_core::alerts::{build_alerts, HighAmountRule};
use spendwatch_core::{AlertReason, Database, FraudAlert};

use super::{load_config, open_db};

pub fn cmd_alerts(db_path: &Path, config_path: Option<&Path>, user_id: &str) -> Result<()> {
    let db = open_db(db_path)?;
    let rule = HighAmountRule::from_config(&load_config(config_path, None)?);
    let alerts = list_alerts(&db, user_id, &rule)?;

    if alerts.is_empty() {
        println!("✅ No fraud alerts for {}.", user_id);
        return Ok(());
    }

    println!();
    println!("⚠️  Fraud alerts for {}", user_id);
    println!("   ─────────────────────────────────────────────────────────────");

    for alert in &alerts {
        let icons: String = alert.reasons.iter().map(|r| reason_icon(*r)).collect();
        let reasons: Vec<&str> = alert.reasons.iter().map(|r| r.as_str()).collect();

        println!(
            "   {} #{} {:>12.2}  {}  {}",
            icons,
            alert.transaction_id,
            alert.amount,
            alert.category.as_deref().unwrap_or("-"),
            alert.date.format("%Y-%m-%d")
        );
        match alert.anomaly_score {
            Some(score) => println!("      {} (score {:.3})", reasons.join(", "), score),
            None => println!("      {}", reasons.join(", ")),
        }
    }
    println!();

    Ok(())
}

/// Alerts for one user from persisted flags plus the high-amount rule
pub fn list_alerts(db: &Database, user_id: &str, rule: &HighAmountRule) -> Result<Vec<FraudAlert>> {
    let flagged = db.list_flagged(user_id, rule.threshold)?;
    Ok(build_alerts(&flagged, rule))
}

fn reason_icon(reason: AlertReason) -> &'static str {
    match reason {
        AlertReason::AnomalyScore => "🌲",
        AlertReason::Behavior => "📊",
        AlertReason::HighAmount => "💰",
    }
}
