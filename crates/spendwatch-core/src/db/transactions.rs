//! Transaction operations

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::history::HistorySource;
use crate::models::{NewTransaction, Transaction};

const SELECT_COLUMNS: &str = "SELECT id, user_id, amount, category, description, date, \
     anomaly_score, is_suspicious, behavior_flag FROM transactions";

impl Database {
    /// Insert a transaction for a user, returning the stored (unscored) row
    pub fn insert_transaction(&self, user_id: &str, tx: &NewTransaction) -> Result<Transaction> {
        if !tx.amount.is_finite() {
            return Err(Error::InvalidData(format!(
                "amount must be a number, got {}",
                tx.amount
            )));
        }

        let date = tx.date.unwrap_or_else(Utc::now);
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO transactions (user_id, amount, category, description, date)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                tx.amount,
                tx.category,
                tx.description,
                date.to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )?;

        let mut stored = Transaction::new(user_id, tx.amount, tx.category.as_deref(), date);
        stored.id = conn.last_insert_rowid();
        stored.description = tx.description.clone();
        Ok(stored)
    }

    /// Get a transaction by ID
    pub fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let tx = conn
            .query_row(&format!("{} WHERE id = ?", SELECT_COLUMNS), params![id], |row| {
                Self::row_to_transaction(row)
            })
            .optional()?;
        Ok(tx)
    }

    /// A user's transactions, newest first
    pub fn list_transactions(&self, user_id: &str, limit: i64) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE user_id = ? ORDER BY date DESC, id DESC LIMIT ?",
            SELECT_COLUMNS
        ))?;

        let transactions = stmt
            .query_map(params![user_id, limit], |row| Self::row_to_transaction(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// The most recent `window` transactions for a user (the detection baseline)
    pub fn list_history(&self, user_id: &str, window: usize) -> Result<Vec<Transaction>> {
        self.list_transactions(user_id, i64::try_from(window).unwrap_or(i64::MAX))
    }

    /// Persist detection results for a stored transaction
    pub fn update_detection_flags(&self, id: i64, scored: &Transaction) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            r#"
            UPDATE transactions
            SET anomaly_score = ?, is_suspicious = ?, behavior_flag = ?
            WHERE id = ?
            "#,
            params![
                scored.anomaly_score,
                scored.is_suspicious,
                scored.behavior_flag,
                id
            ],
        )?;

        if updated == 0 {
            return Err(Error::NotFound(format!("transaction {}", id)));
        }
        Ok(())
    }

    /// Transactions carrying any alert reason: a detection flag, or an
    /// amount above `high_amount_threshold`. Newest first.
    pub fn list_flagged(&self, user_id: &str, high_amount_threshold: f64) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE user_id = ? AND (is_suspicious = 1 OR behavior_flag = 1 OR amount > ?) \
             ORDER BY date DESC, id DESC",
            SELECT_COLUMNS
        ))?;

        let transactions = stmt
            .query_map(params![user_id, high_amount_threshold], |row| {
                Self::row_to_transaction(row)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Count a user's stored transactions
    pub fn count_transactions(&self, user_id: &str) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub(crate) fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<Transaction> {
        let date_str: String = row.get(5)?;
        Ok(Transaction {
            id: row.get(0)?,
            user_id: row.get(1)?,
            amount: row.get(2)?,
            category: row.get(3)?,
            description: row.get(4)?,
            date: parse_datetime(&date_str),
            anomaly_score: row.get(6)?,
            is_suspicious: row.get(7)?,
            behavior_flag: row.get(8)?,
        })
    }
}

#[async_trait]
impl HistorySource for Database {
    async fn historical_transactions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Transaction>> {
        let db = self.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || db.list_history(&user_id, limit))
            .await
            .map_err(|e| Error::History(format!("history query task failed: {}", e)))?
    }
}
