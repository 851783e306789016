//! Extension lifecycle

use std::sync::Arc;

use crate::{DataPlaneHttpClient, PipelineService, Result, Vault};

/// Services handed to extensions during initialization
#[derive(Clone)]
pub struct ServiceExtensionContext {
    http_client: Arc<DataPlaneHttpClient>,
    pipeline_service: Arc<dyn PipelineService>,
    vault: Arc<dyn Vault>,
    partition_size: usize,
    max_concurrency: usize,
}

impl ServiceExtensionContext {
    pub fn new(
        http_client: Arc<DataPlaneHttpClient>,
        pipeline_service: Arc<dyn PipelineService>,
        vault: Arc<dyn Vault>,
        partition_size: usize,
        max_concurrency: usize,
    ) -> Self {
        Self {
            http_client,
            pipeline_service,
            vault,
            partition_size,
            max_concurrency,
        }
    }

    pub fn http_client(&self) -> Arc<DataPlaneHttpClient> {
        Arc::clone(&self.http_client)
    }

    pub fn pipeline_service(&self) -> Arc<dyn PipelineService> {
        Arc::clone(&self.pipeline_service)
    }

    pub fn vault(&self) -> Arc<dyn Vault> {
        Arc::clone(&self.vault)
    }

    /// Number of parts a parallel sink sends per request
    pub fn partition_size(&self) -> usize {
        self.partition_size
    }

    /// Number of partitions a parallel sink sends at the same time
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }
}

impl std::fmt::Debug for ServiceExtensionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceExtensionContext")
            .field("http_client", &self.http_client)
            .field("partition_size", &self.partition_size)
            .field("max_concurrency", &self.max_concurrency)
            .finish_non_exhaustive()
    }
}

/// A unit of functionality plugged into the data plane at startup
pub trait ServiceExtension: Send + Sync {
    fn name(&self) -> &str;

    fn initialize(&self, context: &ServiceExtensionContext) -> Result<()>;
}
