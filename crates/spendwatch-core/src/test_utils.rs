//! Test utilities for spendwatch-core
//!
//! Transaction fixtures shared by unit tests here and by the server and CLI
//! test suites (through the `test-utils` feature).

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::Transaction;

/// User id given to fixtures that don't name one
pub const TEST_USER: &str = "test-user";

/// Timestamp `n` days before now
pub fn days_ago(n: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(n)
}

/// Unflagged transaction for [`TEST_USER`] dated now
pub fn tx(category: &str, amount: f64) -> Transaction {
    Transaction::new(TEST_USER, amount, Some(category), Utc::now())
}

/// Unflagged transaction for a specific user and date
pub fn tx_for(user_id: &str, category: &str, amount: f64, date: DateTime<Utc>) -> Transaction {
    Transaction::new(user_id, amount, Some(category), date)
}

/// One transaction per amount in a single category, one day apart, newest first
pub fn history(category: &str, amounts: &[f64]) -> Vec<Transaction> {
    amounts
        .iter()
        .enumerate()
        .map(|(i, &amount)| {
            let mut t = tx_for(TEST_USER, category, amount, days_ago(i as i64 + 1));
            t.id = i as i64 + 1;
            t
        })
        .collect()
}

/// `n` positive amounts drawn from N(mean, std_dev), reproducible per seed.
///
/// Box-Muller over a seeded `StdRng`; draws at or below zero are clamped to a
/// cent so fixtures stay valid amounts.
pub fn normal_amounts(mean: f64, std_dev: f64, n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
            let u2: f64 = rng.gen_range(0.0..1.0);
            let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
            (mean + z * std_dev).max(0.01)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_amounts_are_reproducible() {
        let a = normal_amounts(500.0, 50.0, 200, 3);
        let b = normal_amounts(500.0, 50.0, 200, 3);
        assert_eq!(a, b);

        let mean = a.iter().sum::<f64>() / a.len() as f64;
        assert!((mean - 500.0).abs() < 15.0, "sample mean {} too far off", mean);
        assert!(a.iter().all(|&x| x > 0.0));
    }

    #[test]
    fn test_history_is_newest_first() {
        let h = history("Food", &[1.0, 2.0, 3.0]);
        assert_eq!(h.len(), 3);
        assert!(h[0].date > h[1].date);
        assert_eq!(h[2].id, 3);
    }
}
