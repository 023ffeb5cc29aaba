//! Historical transaction sources
//!
//! The application that owns transactions implements [`HistorySource`] so the
//! detector can fetch a user's baseline window without knowing where it lives.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Transaction;

#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Up to `limit` of the user's most recent transactions, newest first
    async fn historical_transactions(&self, user_id: &str, limit: usize)
        -> Result<Vec<Transaction>>;
}

/// In-memory history, used for offline scoring and tests
#[derive(Debug, Clone, Default)]
pub struct StaticHistory {
    transactions: Vec<Transaction>,
}

impl StaticHistory {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }
}

#[async_trait]
impl HistorySource for StaticHistory {
    async fn historical_transactions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Transaction>> {
        let mut matching: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|tx| tx.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.date.cmp(&a.date));
        matching.truncate(limit);
        Ok(matching)
    }
}
