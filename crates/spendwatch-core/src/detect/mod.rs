//! Transaction anomaly detection
//!
//! Scores a user's new transactions against a baseline built from their
//! history:
//! - Isolation forest: structurally unusual transactions (`isSuspicious`)
//! - Behavioral z-score: amounts far from the category mean (`behaviorFlag`)
//!
//! Both flags are surfaced independently. Detection is best-effort: any
//! failure degrades to unflagged transactions, never to an error for the
//! caller.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::DetectionConfig;
use crate::history::HistorySource;
use crate::models::Transaction;

pub mod encoder;
pub mod forest;
pub mod policy;
pub mod stats;
pub mod zscore;

pub use encoder::{encode, encode_all, is_valid_amount, FeatureVector};
pub use forest::{average_path_length, ForestParams, IsolationForest, ThresholdDirection};
pub use policy::HistoryPolicy;
pub use stats::{build_stats, CategoryBaseline, CategoryStats};
pub use zscore::{z_score, BehaviorAnalyzer};

/// Score attached when the forest did not run.
///
/// It shares the forest's scale, where 0.0 reads as strongly normal, so
/// `DetectionReport::forest_ran` and `fallback` tell a skipped forest apart
/// from a real score.
pub const FALLBACK_SCORE: f64 = 0.0;

/// Detection failure taxonomy
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectError {
    #[error("insufficient history: have {have}, need {need}")]
    InsufficientData { have: usize, need: usize },

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("compute failure: {0}")]
    ComputeFailure(String),
}

/// Progress of one detection call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStage {
    Idle,
    StatsComputed,
    Scored,
    Merged,
    Done,
}

impl DetectionStage {
    fn advance(self, user_id: &str) -> Self {
        let next = match self {
            Self::Idle => Self::StatsComputed,
            Self::StatsComputed => Self::Scored,
            Self::Scored => Self::Merged,
            Self::Merged | Self::Done => Self::Done,
        };
        debug!(user_id, from = ?self, to = ?next, "Detection stage");
        next
    }
}

/// Why a call returned default flags for some or all analyzers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    /// Fewer historical transactions than the policy minimum
    InsufficientHistory,
    /// The history fetch failed or timed out
    HistoryUnavailable,
    /// Fitting or scoring failed; nothing was flagged
    ComputeFailure,
}

/// Summary of one detection call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionReport {
    pub stage: DetectionStage,
    pub history_count: usize,
    pub scored_count: usize,
    pub forest_ran: bool,
    pub fallback: Option<Fallback>,
    pub suspicious_count: usize,
    pub behavior_count: usize,
}

/// New transactions with detection fields set, plus the call summary
#[derive(Debug, Clone)]
pub struct DetectionOutcome {
    pub transactions: Vec<Transaction>,
    pub report: DetectionReport,
}

/// Runs both analyzers over a user's new transactions.
///
/// Stateless: the forest and baselines are rebuilt on every call.
#[derive(Debug, Clone, Default)]
pub struct Detector {
    config: DetectionConfig,
}

impl Detector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Detect with the configured seed, or entropy when none is set
    pub fn detect(&self, history: &[Transaction], new: &[Transaction]) -> DetectionOutcome {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.detect_with_rng(history, new, &mut rng)
    }

    /// Detect using the given random source for tree building
    pub fn detect_with_rng<R: Rng + ?Sized>(
        &self,
        history: &[Transaction],
        new: &[Transaction],
        rng: &mut R,
    ) -> DetectionOutcome {
        match self.run(history, new, rng) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    user_id = user_label(new),
                    history = history.len(),
                    new = new.len(),
                    error = %e,
                    "Detection failed, returning unflagged transactions"
                );
                unflagged(new, history.len(), Fallback::ComputeFailure)
            }
        }
    }

    /// Fetch the user's history and detect off the async executor.
    ///
    /// A failed or timed-out fetch is treated as empty history. Scoring runs
    /// on the blocking pool; if that task dies the transactions come back
    /// unflagged.
    pub async fn detect_for_user<S>(
        &self,
        source: &S,
        user_id: &str,
        new: Vec<Transaction>,
    ) -> DetectionOutcome
    where
        S: HistorySource + ?Sized,
    {
        let fetch = tokio::time::timeout(
            self.config.fetch_timeout,
            source.historical_transactions(user_id, self.config.history_window),
        )
        .await;

        let (history, unavailable) = match fetch {
            Ok(Ok(history)) => (history, false),
            Ok(Err(e)) => {
                warn!(user_id, error = %e, "History fetch failed, treating history as empty");
                (Vec::new(), true)
            }
            Err(_) => {
                warn!(
                    user_id,
                    timeout_ms = self.config.fetch_timeout.as_millis() as u64,
                    "History fetch timed out, treating history as empty"
                );
                (Vec::new(), true)
            }
        };

        let history_count = history.len();
        let new_count = new.len();
        let fallback_new = new.clone();
        let detector = self.clone();

        match tokio::task::spawn_blocking(move || detector.detect(&history, &new)).await {
            Ok(mut outcome) => {
                if unavailable {
                    outcome.report.fallback = Some(Fallback::HistoryUnavailable);
                }
                info!(
                    user_id,
                    history = history_count,
                    scored = outcome.report.scored_count,
                    suspicious = outcome.report.suspicious_count,
                    behavior = outcome.report.behavior_count,
                    "Detection complete"
                );
                outcome
            }
            Err(e) => {
                error!(
                    user_id,
                    history = history_count,
                    new = new_count,
                    error = %e,
                    "Detection task failed, returning unflagged transactions"
                );
                unflagged(&fallback_new, history_count, Fallback::ComputeFailure)
            }
        }
    }

    fn run<R: Rng + ?Sized>(
        &self,
        history: &[Transaction],
        new: &[Transaction],
        rng: &mut R,
    ) -> Result<DetectionOutcome, DetectError> {
        let user_id = user_label(new);
        let mut stage = DetectionStage::Idle;

        // Rows the encoder would reject cannot be part of the baseline
        let received = history.len();
        let history: Vec<Transaction> = history
            .iter()
            .filter(|tx| is_valid_amount(tx.amount))
            .cloned()
            .collect();
        let skipped = received - history.len();
        if skipped > 0 {
            warn!(user_id, skipped, "Ignoring historical transactions with invalid amounts");
        }

        let stats = CategoryStats::build(&history);
        stage = stage.advance(user_id);

        let policy = HistoryPolicy::from_config(&self.config);
        let sufficient = policy.is_sufficient(history.len());

        let forest_results = if sufficient {
            self.score_with_forest(&history, new, rng)?
        } else {
            debug!(
                user_id,
                history = history.len(),
                min_history = policy.min_history,
                "Not enough history for the isolation forest"
            );
            vec![(FALLBACK_SCORE, false); new.len()]
        };

        let analyzer =
            BehaviorAnalyzer::new(&stats, history.len(), self.config.z_threshold, policy);
        let behavior: Vec<bool> = new
            .iter()
            .map(|tx| is_valid_amount(tx.amount) && analyzer.analyze(tx))
            .collect();
        stage = stage.advance(user_id);

        let transactions: Vec<Transaction> = new
            .iter()
            .zip(forest_results)
            .zip(behavior)
            .map(|((tx, (score, suspicious)), behavior_flag)| {
                tx.clone().with_flags(score, suspicious, behavior_flag)
            })
            .collect();
        stage = stage.advance(user_id);

        let report = DetectionReport {
            stage: stage.advance(user_id),
            history_count: history.len(),
            scored_count: transactions.len(),
            forest_ran: sufficient,
            fallback: (!sufficient).then_some(Fallback::InsufficientHistory),
            suspicious_count: transactions.iter().filter(|t| t.is_suspicious()).count(),
            behavior_count: transactions.iter().filter(|t| t.behavior_flag()).count(),
        };

        Ok(DetectionOutcome {
            transactions,
            report,
        })
    }

    /// Fit on history plus the new points and score the new points.
    ///
    /// Malformed new transactions get the fallback score and are never suspicious.
    fn score_with_forest<R: Rng + ?Sized>(
        &self,
        history: &[Transaction],
        new: &[Transaction],
        rng: &mut R,
    ) -> Result<Vec<(f64, bool)>, DetectError> {
        let categories = &self.config.categories;

        let mut vectors = encode_all(history, categories)?;
        let new_vectors: Vec<Option<FeatureVector>> = new
            .iter()
            .map(|tx| match encode(tx, categories) {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed transaction");
                    None
                }
            })
            .collect();
        vectors.extend(new_vectors.iter().flatten().cloned());

        let forest = IsolationForest::fit(&vectors, ForestParams::from_config(&self.config), rng)?;

        Ok(new_vectors
            .iter()
            .map(|vector| match vector {
                Some(v) => {
                    let score = forest.score_one(v);
                    (score, forest.is_anomalous(score))
                }
                None => (FALLBACK_SCORE, false),
            })
            .collect())
    }
}

/// Every transaction with both flags false
fn unflagged(new: &[Transaction], history_count: usize, fallback: Fallback) -> DetectionOutcome {
    let transactions: Vec<Transaction> = new
        .iter()
        .map(|tx| tx.clone().with_flags(FALLBACK_SCORE, false, false))
        .collect();

    DetectionOutcome {
        report: DetectionReport {
            stage: DetectionStage::Done,
            history_count,
            scored_count: transactions.len(),
            forest_ran: false,
            fallback: Some(fallback),
            suspicious_count: 0,
            behavior_count: 0,
        },
        transactions,
    }
}

fn user_label(new: &[Transaction]) -> &str {
    new.first().map(|tx| tx.user_id.as_str()).unwrap_or("")
}
