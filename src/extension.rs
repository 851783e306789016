//! Registers the DICOMweb source and sink with a data plane

use dataplane_spi::{ServiceExtension, ServiceExtensionContext};
use std::sync::Arc;
use tracing::info;

use crate::client::DicomWebClient;
use crate::sink::DicomWebDataSinkFactory;
use crate::source::DicomWebDataSourceFactory;

#[derive(Debug, Default)]
pub struct DataPlaneDicomWebExtension;

impl DataPlaneDicomWebExtension {
    pub const NAME: &'static str = "Data Plane DicomWeb";

    pub fn new() -> Self {
        Self
    }
}

impl ServiceExtension for DataPlaneDicomWebExtension {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn initialize(&self, context: &ServiceExtensionContext) -> dataplane_spi::Result<()> {
        let client = DicomWebClient::new(context.http_client());
        let pipeline = context.pipeline_service();

        pipeline.register_source_factory(Arc::new(DicomWebDataSourceFactory::new(
            client.clone(),
            context.vault(),
        )));
        pipeline.register_sink_factory(Arc::new(
            DicomWebDataSinkFactory::new(client, context.vault(), context.partition_size())
                .with_max_concurrency(context.max_concurrency()),
        ));

        info!("{} extension initialized", Self::NAME);
        Ok(())
    }
}
