//! Error types for SpendWatch

use thiserror::Error;

use crate::detect::DetectError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("History unavailable: {0}")]
    History(String),

    #[error("Detection error: {0}")]
    Detection(#[from] DetectError),
}

pub type Result<T> = std::result::Result<T, Error>;
