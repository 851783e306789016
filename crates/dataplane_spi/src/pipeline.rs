//! Sources, sinks and the pipeline registry that pairs them per transfer

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::stream::{BoxStream, StreamExt};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

use crate::{DataFlowStartMessage, Result, StreamFailure, StreamResult};

/// Byte stream of a single part
pub type PartStream = BoxStream<'static, std::io::Result<Bytes>>;

/// A unit of data produced by a source, e.g. one file or one DICOM instance
pub trait Part: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// Size in bytes, `None` when unknown
    fn size(&self) -> Option<u64> {
        None
    }

    fn media_type(&self) -> &str {
        "application/octet-stream"
    }

    fn open_stream(&self) -> Result<PartStream>;
}

/// Read a part's stream to the end
pub async fn read_all(part: &dyn Part) -> Result<Bytes> {
    let mut stream = part.open_stream()?;
    let mut buf = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        buf.extend_from_slice(&chunk?);
    }
    Ok(buf.freeze())
}

/// Produces the parts of a transfer
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn open_part_stream(&self) -> StreamResult<Vec<Box<dyn Part>>>;

    /// Release any resources held by the source
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Consumes the parts of a source
#[async_trait]
pub trait DataSink: Send + Sync {
    async fn transfer(&self, source: Box<dyn DataSource>) -> StreamResult<()>;
}

/// Creates sources for the data address types it supports
pub trait DataSourceFactory: Send + Sync {
    fn supported_type(&self) -> &str;

    fn can_handle(&self, request: &DataFlowStartMessage) -> bool;

    fn validate_request(&self, request: &DataFlowStartMessage) -> std::result::Result<(), String>;

    fn create_source(&self, request: &DataFlowStartMessage) -> Result<Box<dyn DataSource>>;
}

/// Creates sinks for the data address types it supports
pub trait DataSinkFactory: Send + Sync {
    fn supported_type(&self) -> &str;

    fn can_handle(&self, request: &DataFlowStartMessage) -> bool;

    fn validate_request(&self, request: &DataFlowStartMessage) -> std::result::Result<(), String>;

    fn create_sink(&self, request: &DataFlowStartMessage) -> Result<Box<dyn DataSink>>;
}

/// Registry of source and sink factories that executes transfers
#[async_trait]
pub trait PipelineService: Send + Sync {
    fn register_source_factory(&self, factory: Arc<dyn DataSourceFactory>);

    fn register_sink_factory(&self, factory: Arc<dyn DataSinkFactory>);

    /// True when both a source and a sink factory accept the request
    fn can_handle(&self, request: &DataFlowStartMessage) -> bool;

    /// Validate the request against the matching factories
    fn validate(&self, request: &DataFlowStartMessage) -> std::result::Result<(), Vec<String>>;

    /// Transfer from the request's source to its destination
    async fn transfer(&self, request: &DataFlowStartMessage) -> StreamResult<()>;

    /// Transfer from the request's source into the given sink
    async fn transfer_to_sink(
        &self,
        request: &DataFlowStartMessage,
        sink: Box<dyn DataSink>,
    ) -> StreamResult<()>;

    fn supported_source_types(&self) -> Vec<String>;

    fn supported_sink_types(&self) -> Vec<String>;
}

/// Default [`PipelineService`] backed by in-memory factory lists
#[derive(Default)]
pub struct PipelineServiceImpl {
    source_factories: RwLock<Vec<Arc<dyn DataSourceFactory>>>,
    sink_factories: RwLock<Vec<Arc<dyn DataSinkFactory>>>,
}

impl PipelineServiceImpl {
    pub fn new() -> Self {
        Self::default()
    }

    fn source_factory(&self, request: &DataFlowStartMessage) -> Option<Arc<dyn DataSourceFactory>> {
        self.source_factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|f| f.can_handle(request))
            .cloned()
    }

    fn sink_factory(&self, request: &DataFlowStartMessage) -> Option<Arc<dyn DataSinkFactory>> {
        self.sink_factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|f| f.can_handle(request))
            .cloned()
    }

    fn create_source(&self, request: &DataFlowStartMessage) -> StreamResult<Box<dyn DataSource>> {
        let factory = self.source_factory(request).ok_or_else(|| {
            StreamFailure::error(format!(
                "Unknown data source type {}",
                request.source_type().unwrap_or("<none>")
            ))
        })?;
        factory
            .create_source(request)
            .map_err(|e| StreamFailure::error(e.to_string()))
    }
}

impl std::fmt::Debug for PipelineServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineServiceImpl")
            .field("source_types", &self.supported_source_types())
            .field("sink_types", &self.supported_sink_types())
            .finish()
    }
}

#[async_trait]
impl PipelineService for PipelineServiceImpl {
    fn register_source_factory(&self, factory: Arc<dyn DataSourceFactory>) {
        debug!("Registering source factory for type {}", factory.supported_type());
        self.source_factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(factory);
    }

    fn register_sink_factory(&self, factory: Arc<dyn DataSinkFactory>) {
        debug!("Registering sink factory for type {}", factory.supported_type());
        self.sink_factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(factory);
    }

    fn can_handle(&self, request: &DataFlowStartMessage) -> bool {
        self.source_factory(request).is_some() && self.sink_factory(request).is_some()
    }

    fn validate(&self, request: &DataFlowStartMessage) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        match self.source_factory(request) {
            Some(factory) => {
                if let Err(e) = factory.validate_request(request) {
                    errors.push(e);
                }
            }
            None => errors.push(format!(
                "Cannot find a source factory for type {}",
                request.source_type().unwrap_or("<none>")
            )),
        }

        match self.sink_factory(request) {
            Some(factory) => {
                if let Err(e) = factory.validate_request(request) {
                    errors.push(e);
                }
            }
            None => errors.push(format!(
                "Cannot find a sink factory for type {}",
                request.destination_type().unwrap_or("<none>")
            )),
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    #[tracing::instrument(skip(self, request), fields(request_id = %request.id))]
    async fn transfer(&self, request: &DataFlowStartMessage) -> StreamResult<()> {
        let sink_factory = self.sink_factory(request).ok_or_else(|| {
            StreamFailure::error(format!(
                "Unknown data sink type {}",
                request.destination_type().unwrap_or("<none>")
            ))
        })?;
        let sink = sink_factory
            .create_sink(request)
            .map_err(|e| StreamFailure::error(e.to_string()))?;

        self.transfer_to_sink(request, sink).await
    }

    async fn transfer_to_sink(
        &self,
        request: &DataFlowStartMessage,
        sink: Box<dyn DataSink>,
    ) -> StreamResult<()> {
        let source = self.create_source(request)?;

        info!(
            "Transferring from {} to {}",
            request.source_type().unwrap_or("<none>"),
            request.destination_type().unwrap_or("<none>")
        );
        let result = sink.transfer(source).await;
        match &result {
            Ok(()) => info!("Transfer {} completed", request.id),
            Err(failure) => warn!("Transfer {} failed: {}", request.id, failure),
        }
        result
    }

    fn supported_source_types(&self) -> Vec<String> {
        self.source_factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|f| f.supported_type().to_string())
            .collect()
    }

    fn supported_sink_types(&self) -> Vec<String> {
        self.sink_factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|f| f.supported_type().to_string())
            .collect()
    }
}
