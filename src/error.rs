//! Error types for the Lattice correction detector
//!
//! Structured error definitions use thiserror; callers at the binary edge
//! propagate with anyhow.

use thiserror::Error;

/// Main error type for Lattice operations
#[derive(Error, Debug)]
pub enum LatticeError {
    /// Knowledge store operation failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Timestamp could not be parsed as an instant
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Lattice operations
pub type Result<T> = std::result::Result<T, LatticeError>;

/// Convert anyhow::Error to LatticeError
impl From<anyhow::Error> for LatticeError {
    fn from(err: anyhow::Error) -> Self {
        LatticeError::Other(err.to_string())
    }
}
