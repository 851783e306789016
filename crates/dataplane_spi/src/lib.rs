//! Data-plane service provider interfaces
//!
//! This crate holds the contracts that data-plane extensions implement and the
//! shared services they are handed at initialization time.
//!
//! # Contents
//! - Data addresses and flow start messages exchanged with the control plane
//! - Source, sink and factory traits plus the pipeline registry that wires them
//! - A shared outbound HTTP client with retry on transient failures
//! - A secret vault for credentials that should not travel in data addresses

pub mod address;
pub mod error;
pub mod http;
pub mod message;
pub mod pipeline;
pub mod result;
pub mod system;
pub mod vault;

// Re-export commonly used types
pub use address::DataAddress;
pub use error::{Result, SpiError};
pub use http::{DataPlaneHttpClient, HttpClientConfig};
pub use message::DataFlowStartMessage;
pub use pipeline::{
    read_all, DataSink, DataSinkFactory, DataSource, DataSourceFactory, Part, PartStream,
    PipelineService, PipelineServiceImpl,
};
pub use result::{FailureReason, StreamFailure, StreamResult};
pub use system::{ServiceExtension, ServiceExtensionContext};
pub use vault::{InMemoryVault, Vault};
