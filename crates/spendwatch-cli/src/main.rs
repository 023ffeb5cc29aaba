//! SpendWatch CLI - Transaction anomaly detection
//!
//! Usage:
//!   spendwatch score --history H.json --new N.json   Score transactions offline
//!   spendwatch serve --port 3000                     Start web server
//!   spendwatch alerts --user alice                   Show stored fraud alerts
//!   spendwatch config                                Print effective config

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // Logs go to stderr so `score` output stays pipeable
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Score {
            history,
            new,
            seed,
            user,
            pretty,
        } => {
            commands::cmd_score(config_path, &history, &new, seed, user.as_deref(), pretty).await
        }
        Commands::Serve {
            port,
            host,
            origins,
        } => commands::cmd_serve(&cli.db, config_path, &host, port, origins).await,
        Commands::Alerts { user } => commands::cmd_alerts(&cli.db, config_path, &user),
        Commands::Config => commands::cmd_config(config_path),
    }
}
