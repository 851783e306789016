mod logging_config;
mod runtime_config;
pub mod config;

pub use config::{Config, ConfigError, TransferConfig};
pub use logging_config::LoggingConfig;
pub use runtime_config::RuntimeConfig;
