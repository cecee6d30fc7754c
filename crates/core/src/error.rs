//! Error types for the ContextGate domain.
//!
//! Uses `thiserror` for ergonomic error definitions. A failed compression
//! attempt is never an error: it is a failing verdict. Errors here cover
//! contract violations by the caller and the plumbing around packs.

use thiserror::Error;

/// The top-level error type for all ContextGate operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Caller contract violations ---
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- I/O ---
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for an [`Error::InvalidInput`].
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Whether this error is a caller contract violation.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;
