//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `alerts` - Stored fraud alerts for a user
//! - `config` - Effective configuration output
//! - `core` - Shared utilities (open_db, load_config, read_transactions)
//! - `score` - Offline scoring of JSON transaction files
//! - `serve` - Web server command

pub mod alerts;
pub mod config;
pub mod core;
pub mod score;
pub mod serve;

// Re-export command functions for main.rs
pub use alerts::*;
pub use config::*;
pub use core::*;
pub use score::*;
pub use serve::*;
