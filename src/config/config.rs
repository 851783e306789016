use dataplane_spi::HttpClientConfig;
use dataplane_util::{DEFAULT_MAX_CONCURRENCY, DEFAULT_PARTITION_SIZE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::{LoggingConfig, RuntimeConfig};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Data-plane configuration, loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub runtime: RuntimeConfig,
    pub logging: LoggingConfig,
    pub http: HttpClientConfig,
    pub transfer: TransferConfig,
    /// Seeds the in-memory vault
    pub secrets: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Parts sent per STOW-RS request
    pub partition_size: usize,

    /// STOW-RS requests of one transfer in flight at once
    pub max_concurrency: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            partition_size: DEFAULT_PARTITION_SIZE,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl Config {
    /// Read, parse and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.runtime.validate()?;
        self.logging.validate()?;
        self.http
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.transfer.partition_size == 0 {
            return Err(ConfigError::Invalid(
                "transfer.partition_size must be greater than zero".into(),
            ));
        }
        if self.transfer.max_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "transfer.max_concurrency must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
