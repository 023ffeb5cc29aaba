//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// SpendWatch - Flag unusual spending before it becomes fraud
#[derive(Parser)]
#[command(name = "spendwatch")]
#[command(about = "Per-user transaction anomaly detection", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "spendwatch.db", global = true)]
    pub db: PathBuf,

    /// Detection config file (TOML); defaults to the data-dir override if present
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score new transactions against a history file (JSON arrays in, JSON out)
    Score {
        /// Historical transactions (JSON array)
        #[arg(long)]
        history: PathBuf,

        /// Transactions to score (JSON array)
        #[arg(long)]
        new: PathBuf,

        /// Fixed RNG seed for reproducible scores
        #[arg(long)]
        seed: Option<u64>,

        /// Only use this user's history, and score the new transactions as theirs
        #[arg(short, long)]
        user: Option<String>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Allowed CORS origin (repeatable)
        #[arg(long = "origin")]
        origins: Vec<String>,
    },

    /// Show fraud alerts for a user from the database
    Alerts {
        /// User ID
        #[arg(short, long)]
        user: String,
    },

    /// Print the effective detection configuration as TOML
    Config,
}
