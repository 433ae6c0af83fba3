//! Error types for the claims provider

use thiserror::Error;

/// Claims provider errors
#[derive(Debug, Error)]
pub enum ClaimsError {
    /// Identifier contains characters outside `[a-zA-Z0-9_-]`
    #[error("{field} [{value}] contains illegal characters")]
    InvalidIdentifier {
        /// Name of the offending parameter
        field: &'static str,
        /// The rejected value
        value: String,
    },

    /// Request is structurally invalid
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Claim record does not exist
    #[error("Claim record not found: {0}")]
    RecordNotFound(String),

    /// Document store access failed
    #[error("Store error: {0}")]
    Store(String),

    /// Record (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for claims operations
pub type Result<T> = std::result::Result<T, ClaimsError>;
