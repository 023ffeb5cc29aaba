//! Config command

use std::path::Path;

use anyhow::{Context, Result};
use spendwatch_core::config::default_config_path;

use super::load_config;

pub fn cmd_config(config_path: Option<&Path>) -> Result<()> {
    print!("{}", render_config(config_path)?);
    Ok(())
}

/// Effective config as TOML, headed by a comment naming where it came from
pub fn render_config(config_path: Option<&Path>) -> Result<String> {
    let config = load_config(config_path, None)?;

    let source = match config_path {
        Some(path) => path.display().to_string(),
        None => match default_config_path() {
            Some(path) if path.exists() => path.display().to_string(),
            _ => "built-in defaults".to_string(),
        },
    };

    let body = config.to_toml().context("Failed to render config")?;
    Ok(format!("# Effective detection config ({})\n\n{}", source, body))
}
