//! Error types for data-plane SPI operations

use thiserror::Error;

/// Result type alias for SPI operations
pub type Result<T> = std::result::Result<T, SpiError>;

/// Error types that can occur while building or running data-plane components
#[derive(Error, Debug)]
pub enum SpiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Build error: {0}")]
    Build(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SpiError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new build error
    pub fn build(msg: impl Into<String>) -> Self {
        Self::Build(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if this error is worth retrying
    pub fn is_recoverable(&self) -> bool {
        match self {
            SpiError::Http(e) => e.is_connect() || e.is_timeout(),
            SpiError::Io(_) => true,
            _ => false,
        }
    }
}
