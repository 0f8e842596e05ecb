//! Error types for the locator tool
//!
//! Failures of the collaborators around the locator (generator process,
//! cache files, bookmark database) are kept apart from the locator's own
//! `NotFound` / `IllFormedIndex` outcomes.

use std::path::PathBuf;

use thiserror::Error;

use crate::locator::LocateError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("CFI generator failed: {0}")]
    Generator(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Whether this is a definitive "text not in book" outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::Locate(LocateError::NotFound { .. }))
    }
}
