//! Detection handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::validate_user_id;
use crate::{AppError, AppState, MAX_DETECT_BATCH};
use spendwatch_core::detect::{is_valid_amount, DetectionReport};
use spendwatch_core::models::Transaction;

/// Detection request body
#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    pub transactions: Vec<Transaction>,
}

/// Detection response
#[derive(Serialize)]
pub struct DetectResponse {
    pub transactions: Vec<Transaction>,
    pub report: DetectionReport,
}

/// POST /api/users/:user_id/detect - Score transactions without storing them
pub async fn detect_transactions(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(body): Json<DetectRequest>,
) -> Result<Json<DetectResponse>, AppError> {
    validate_user_id(&user_id)?;

    if body.transactions.len() > MAX_DETECT_BATCH {
        return Err(AppError::bad_request(&format!(
            "at most {} transactions per request",
            MAX_DETECT_BATCH
        )));
    }

    if let Some(bad) = body.transactions.iter().find(|tx| !is_valid_amount(tx.amount)) {
        return Err(AppError::bad_request(&format!(
            "transaction {} amount must be a positive number",
            bad.id
        )));
    }

    // The path decides whose history the batch is scored against
    let transactions = body
        .transactions
        .into_iter()
        .map(|mut tx| {
            tx.user_id = user_id.clone();
            tx
        })
        .collect();

    let outcome = state
        .detector
        .detect_for_user(&state.db, &user_id, transactions)
        .await;

    Ok(Json(DetectResponse {
        transactions: outcome.transactions,
        report: outcome.report,
    }))
}
