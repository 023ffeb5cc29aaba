//! Transaction handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use super::validate_user_id;
use crate::{AppError, AppState, MAX_PAGE_LIMIT};
use spendwatch_core::detect::is_valid_amount;
use spendwatch_core::models::{NewTransaction, Transaction};

/// Query parameters for listing transactions
#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

/// GET /api/users/:user_id/transactions - List a user's transactions, newest first
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(params): Query<TransactionQuery>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    validate_user_id(&user_id)?;

    // Input validation: clamp pagination parameters
    let limit = params.limit.clamp(1, MAX_PAGE_LIMIT);

    let transactions = state.db.list_transactions(&user_id, limit)?;
    Ok(Json(transactions))
}

/// POST /api/users/:user_id/transactions - Record a transaction and score it
///
/// The transaction is scored against the history recorded before it, stored,
/// and then has its flags written back. A detection problem only means the
/// stored transaction carries default flags.
pub async fn record_transaction(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(mut body): Json<NewTransaction>,
) -> Result<Json<Transaction>, AppError> {
    validate_user_id(&user_id)?;

    if !is_valid_amount(body.amount) {
        return Err(AppError::bad_request("amount must be a positive number"));
    }

    // Pin the date so the scored and stored copies agree
    let date = *body.date.get_or_insert_with(Utc::now);
    let mut candidate = Transaction::new(&user_id, body.amount, body.category.as_deref(), date);
    candidate.description = body.description.clone();

    let outcome = state
        .detector
        .detect_for_user(&state.db, &user_id, vec![candidate])
        .await;

    let stored = state.db.insert_transaction(&user_id, &body)?;

    let Some(result) = outcome.transactions.into_iter().next() else {
        warn!(user_id = %user_id, id = stored.id, "Detection returned no result");
        return Ok(Json(stored));
    };

    let scored = stored.clone().with_flags(
        result.anomaly_score.unwrap_or_default(),
        result.is_suspicious(),
        result.behavior_flag(),
    );

    if let Err(e) = state.db.update_detection_flags(stored.id, &scored) {
        warn!(user_id = %user_id, id = stored.id, error = %e, "Failed to persist detection flags");
        return Ok(Json(stored));
    }

    if scored.is_suspicious() || scored.behavior_flag() {
        info!(
            user_id = %user_id,
            id = scored.id,
            suspicious = scored.is_suspicious(),
            behavior = scored.behavior_flag(),
            "Flagged transaction"
        );
    }

    Ok(Json(scored))
}
