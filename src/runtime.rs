//! Standalone data-plane host for the DICOMweb extension

use dataplane_spi::{
    DataFlowStartMessage, DataPlaneHttpClient, FailureReason, InMemoryVault, PipelineService,
    PipelineServiceImpl, ServiceExtension, ServiceExtensionContext, StreamFailure, StreamResult,
    Vault,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::Config;
use crate::extension::DataPlaneDicomWebExtension;
use crate::Result;

/// Wires the shared services and initializes the extensions
pub struct Runtime {
    config: Config,
    pipeline: Arc<dyn PipelineService>,
    vault: Arc<InMemoryVault>,
}

impl Runtime {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let http_client = Arc::new(DataPlaneHttpClient::new(config.http.clone())?);

        let vault = Arc::new(InMemoryVault::new());
        for (key, value) in &config.secrets {
            vault.store_secret(key, value);
        }
        debug!("Seeded vault with {} secrets", config.secrets.len());

        let pipeline: Arc<dyn PipelineService> = Arc::new(PipelineServiceImpl::new());
        let context = ServiceExtensionContext::new(
            http_client,
            Arc::clone(&pipeline),
            vault.clone(),
            config.transfer.partition_size,
            config.transfer.max_concurrency,
        );

        let extensions: Vec<Box<dyn ServiceExtension>> =
            vec![Box::new(DataPlaneDicomWebExtension::new())];
        for extension in &extensions {
            extension.initialize(&context)?;
            debug!("Initialized extension {}", extension.name());
        }

        info!("Data plane '{}' ready", config.runtime.id);
        Ok(Self {
            config,
            pipeline,
            vault,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pipeline(&self) -> Arc<dyn PipelineService> {
        Arc::clone(&self.pipeline)
    }

    pub fn vault(&self) -> Arc<dyn Vault> {
        self.vault.clone()
    }

    pub fn validate(&self, request: &DataFlowStartMessage) -> std::result::Result<(), Vec<String>> {
        self.pipeline.validate(request)
    }

    /// Validate the request, then run it
    pub async fn transfer(&self, request: &DataFlowStartMessage) -> StreamResult<()> {
        if let Err(messages) = self.pipeline.validate(request) {
            return Err(StreamFailure::new(FailureReason::GeneralError, messages));
        }
        self.pipeline.transfer(request).await
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("id", &self.config.runtime.id)
            .field("source_types", &self.pipeline.supported_source_types())
            .field("sink_types", &self.pipeline.supported_sink_types())
            .finish()
    }
}
