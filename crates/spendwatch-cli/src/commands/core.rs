//! Shared command utilities
//!
//! - `open_db` - Open the database
//! - `load_config` - Resolve the detection config, with CLI overrides
//! - `read_transactions` - Parse a JSON transaction file

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use spendwatch_core::{Database, DetectionConfig, Transaction};

/// Open (or create) the database
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    Database::new(path_str).context("Failed to open database")
}

/// Load the detection config; a `seed` given on the command line wins over the file
pub fn load_config(config_path: Option<&Path>, seed: Option<u64>) -> Result<DetectionConfig> {
    let mut config =
        DetectionConfig::load(config_path).context("Failed to load detection config")?;
    if seed.is_some() {
        config.seed = seed;
    }
    Ok(config)
}

/// Read a JSON array of transactions
pub fn read_transactions(path: &Path) -> Result<Vec<Transaction>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of transactions", path.display()))
}
