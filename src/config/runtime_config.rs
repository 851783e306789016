use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Identifies this data plane in logs
    pub id: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            id: default_runtime_id(),
        }
    }
}

impl RuntimeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::Invalid("runtime id must not be empty".into()));
        }
        Ok(())
    }
}

fn default_runtime_id() -> String {
    "dicomweb-dataplane".to_string()
}
