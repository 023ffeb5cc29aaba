//! Server command implementation

use std::path::Path;

use anyhow::{Context, Result};
use spendwatch_core::Detector;
use spendwatch_server::ServerConfig;

use super::{load_config, open_db};

pub async fn cmd_serve(
    db_path: &Path,
    config_path: Option<&Path>,
    host: &str,
    port: u16,
    origins: Vec<String>,
) -> Result<()> {
    println!("🚀 Starting SpendWatch web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);

    let config = load_config(config_path, None)?;
    match config.seed {
        Some(seed) => println!("   🎲 Detection seed: {} (reproducible scores)", seed),
        None => println!("   🎲 Detection seed: random"),
    }
    if !origins.is_empty() {
        println!("   🌐 CORS origins: {}", origins.join(", "));
    }

    let db = open_db(db_path)?;
    let server_config = ServerConfig {
        allowed_origins: origins,
    };

    spendwatch_server::serve_with_config(db, Detector::new(config), host, port, server_config)
        .await
        .context("Server error")
}
