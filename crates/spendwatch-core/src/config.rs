//! Detection configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path, or the override in the data dir
//!    (~/.local/share/spendwatch/config/detection.toml)
//! 2. Embedded defaults (compiled into binary)
//!
//! Override files may set any subset of keys; the rest keep their defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::detect::ThresholdDirection;
use crate::error::{Error, Result};
use crate::models::CategorySet;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/detection.toml");

/// Detection configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    // Isolation forest
    /// Number of trees in the ensemble
    pub tree_count: usize,
    /// Per-tree subsample cap
    pub sample_size: usize,
    /// Expected proportion of anomalous points (0, 0.5]
    pub contamination: f64,
    /// Which side of the contamination cut is anomalous
    pub direction: ThresholdDirection,
    /// Fixed RNG seed for reproducible tree building (None = entropy)
    pub seed: Option<u64>,

    // Behavioral analysis
    /// Absolute z-score above which a transaction is flagged
    pub z_threshold: f64,

    // Insufficient-history policy
    /// Minimum historical transactions for the statistical analyzers
    pub min_history: usize,
    /// Amount above which a transaction is flagged without enough history
    pub fallback_floor: f64,
    /// Number of most recent transactions fetched as the baseline
    pub history_window: usize,
    /// Timeout for the history fetch
    pub fetch_timeout: Duration,

    // Rule-based alerts
    /// Any transaction above this amount raises a high-amount alert
    pub high_amount_threshold: f64,

    /// Known categories, in feature-vector order
    pub categories: CategorySet,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            tree_count: 100,
            sample_size: 256,
            contamination: 0.2,
            direction: ThresholdDirection::HigherIsAnomalous,
            seed: None,
            z_threshold: 3.0,
            min_history: 5,
            fallback_floor: 1000.0,
            history_window: 256,
            fetch_timeout: Duration::from_secs(5),
            high_amount_threshold: 10_000.0,
            categories: CategorySet::default(),
        }
    }
}

impl DetectionConfig {
    /// Load from an explicit path, the default override location, or the embedded defaults
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let content = match override_path {
            Some(path) => fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Failed to read {}: {}", path.display(), e))
            })?,
            None => match default_config_path() {
                Some(path) if path.exists() => fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?,
                _ => DEFAULT_CONFIG.to_string(),
            },
        };

        Self::from_toml(&content)
    }

    /// Parse a (possibly partial) TOML document on top of the defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

        let mut config = Self::default();

        if let Some(categories) = raw.categories {
            config.categories = CategorySet::new(categories);
        }

        if let Some(forest) = raw.forest {
            if let Some(v) = forest.tree_count {
                config.tree_count = v;
            }
            if let Some(v) = forest.sample_size {
                config.sample_size = v;
            }
            if let Some(v) = forest.contamination {
                config.contamination = v;
            }
            if let Some(v) = forest.direction {
                config.direction = v;
            }
            if forest.seed.is_some() {
                config.seed = forest.seed;
            }
        }

        if let Some(behavior) = raw.behavior {
            if let Some(v) = behavior.z_threshold {
                config.z_threshold = v;
            }
        }

        if let Some(history) = raw.history {
            if let Some(v) = history.min_history {
                config.min_history = v;
            }
            if let Some(v) = history.fallback_floor {
                config.fallback_floor = v;
            }
            if let Some(v) = history.window {
                config.history_window = v;
            }
            if let Some(v) = history.fetch_timeout_secs {
                config.fetch_timeout = Duration::from_secs(v);
            }
        }

        if let Some(alerts) = raw.alerts {
            if let Some(v) = alerts.high_amount_threshold {
                config.high_amount_threshold = v;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        let raw = RawConfig {
            categories: Some(self.categories.iter().map(str::to_string).collect()),
            forest: Some(RawForest {
                tree_count: Some(self.tree_count),
                sample_size: Some(self.sample_size),
                contamination: Some(self.contamination),
                direction: Some(self.direction),
                seed: self.seed,
            }),
            behavior: Some(RawBehavior {
                z_threshold: Some(self.z_threshold),
            }),
            history: Some(RawHistory {
                min_history: Some(self.min_history),
                fallback_floor: Some(self.fallback_floor),
                window: Some(self.history_window),
                fetch_timeout_secs: Some(self.fetch_timeout.as_secs()),
            }),
            alerts: Some(RawAlerts {
                high_amount_threshold: Some(self.high_amount_threshold),
            }),
        };

        toml::to_string(&raw).map_err(|e| Error::Config(format!("Failed to render config: {}", e)))
    }

    /// Reject values the detectors cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(Error::Config(format!(
                "contamination must be in (0, 0.5], got {}",
                self.contamination
            )));
        }
        if self.tree_count == 0 {
            return Err(Error::Config("tree_count must be at least 1".to_string()));
        }
        if self.sample_size < 2 {
            return Err(Error::Config("sample_size must be at least 2".to_string()));
        }
        if self.history_window == 0 {
            return Err(Error::Config("history window must be at least 1".to_string()));
        }
        for (name, value) in [
            ("z_threshold", self.z_threshold),
            ("fallback_floor", self.fallback_floor),
            ("high_amount_threshold", self.high_amount_threshold),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::Config(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("spendwatch").join("config").join("detection.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    categories: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    forest: Option<RawForest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    behavior: Option<RawBehavior>,
    #[serde(skip_serializing_if = "Option::is_none")]
    history: Option<RawHistory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alerts: Option<RawAlerts>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawForest {
    tree_count: Option<usize>,
    sample_size: Option<usize>,
    contamination: Option<f64>,
    direction: Option<ThresholdDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBehavior {
    z_threshold: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawHistory {
    min_history: Option<usize>,
    fallback_floor: Option<f64>,
    window: Option<usize>,
    fetch_timeout_secs: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAlerts {
    high_amount_threshold: Option<f64>,
}
