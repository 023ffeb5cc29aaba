//! Alert handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use super::validate_user_id;
use crate::{AppError, AppState};
use spendwatch_core::alerts::{build_alerts, HighAmountRule};
use spendwatch_core::models::FraudAlert;

/// GET /api/users/:user_id/fraud-alerts - Flagged and high-amount transactions
///
/// Reads persisted flags; nothing is re-scored here.
pub async fn list_fraud_alerts(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<FraudAlert>>, AppError> {
    validate_user_id(&user_id)?;

    let rule = HighAmountRule::from_config(state.detector.config());
    let flagged = state.db.list_flagged(&user_id, rule.threshold)?;

    Ok(Json(build_alerts(&flagged, &rule)))
}
