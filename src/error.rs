//! Error types for DICOMweb operations

use dataplane_spi::SpiError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::multipart::MultipartError;

/// Result type alias for DICOMweb operations
pub type Result<T> = std::result::Result<T, DicomWebError>;

#[derive(Error, Debug)]
pub enum DicomWebError {
    #[error("Exception occurred during HTTP request: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse MIME message: {0}")]
    Mime(#[from] MultipartError),

    #[error("Failed to upload file: {0}")]
    Upload(String),

    #[error("Failed to execute WADO-RS: {0}")]
    Retrieve(String),

    #[error("{0}")]
    Build(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging initialization failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Spi(SpiError),
}

impl DicomWebError {
    pub fn build(msg: impl Into<String>) -> Self {
        Self::Build(msg.into())
    }

    /// Transport failures that may succeed on a later attempt
    pub fn is_recoverable(&self) -> bool {
        match self {
            DicomWebError::Http(e) => e.is_connect() || e.is_timeout(),
            DicomWebError::Spi(e) => e.is_recoverable(),
            _ => false,
        }
    }
}

impl From<SpiError> for DicomWebError {
    fn from(err: SpiError) -> Self {
        match err {
            SpiError::Http(e) => DicomWebError::Http(e),
            other => DicomWebError::Spi(other),
        }
    }
}

impl From<DicomWebError> for SpiError {
    fn from(err: DicomWebError) -> Self {
        match err {
            DicomWebError::Spi(inner) => inner,
            DicomWebError::Build(msg) => SpiError::Build(msg),
            other => SpiError::Internal(other.to_string()),
        }
    }
}
