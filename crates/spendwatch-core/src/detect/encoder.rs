//! Feature encoding: transaction -> `[amount, isCat1, ..., isCatN]`
//!
//! The amount is kept raw. Large-amount outliers are supposed to dominate
//! the partitioning, so no scaling is applied.

use super::DetectError;
use crate::models::{CategorySet, Transaction};

/// `[amount, one-hot category...]`, length `1 + categories.len()`
pub type FeatureVector = Vec<f64>;

/// Amounts are positive finite numbers
pub fn is_valid_amount(amount: f64) -> bool {
    amount.is_finite() && amount > 0.0
}

/// Encode one transaction.
///
/// Unknown or missing categories leave the one-hot segment all zero. Only an
/// amount that is non-numeric or not positive is rejected, since it anchors
/// the whole vector.
pub fn encode(tx: &Transaction, categories: &CategorySet) -> Result<FeatureVector, DetectError> {
    if !is_valid_amount(tx.amount) {
        return Err(DetectError::MalformedInput(format!(
            "transaction {} has invalid amount {}",
            tx.id, tx.amount
        )));
    }

    let mut vector = vec![0.0; 1 + categories.len()];
    vector[0] = tx.amount;

    if let Some(idx) = tx
        .category
        .as_deref()
        .and_then(|category| categories.index_of(category))
    {
        vector[1 + idx] = 1.0;
    }

    Ok(vector)
}

/// Encode a batch, failing on the first malformed transaction
pub fn encode_all(
    transactions: &[Transaction],
    categories: &CategorySet,
) -> Result<Vec<FeatureVector>, DetectError> {
    transactions
        .iter()
        .map(|tx| encode(tx, categories))
        .collect()
}
