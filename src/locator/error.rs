//! Locator error types

use thiserror::Error;

/// Failures of a locate operation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocateError {
    /// The normalized query does not occur in the document
    #[error("Text not found in document: {query:?}")]
    NotFound { query: String },

    /// Span bookkeeping of the flat index is inconsistent
    #[error("Ill-formed index: {0}")]
    IllFormedIndex(String),
}

impl LocateError {
    pub(crate) fn not_found(query: &str) -> Self {
        LocateError::NotFound {
            query: query.to_string(),
        }
    }
}

/// Result type alias for locator operations
pub type Result<T> = std::result::Result<T, LocateError>;
