//! Sink that transfers partitions of a source concurrently

use async_trait::async_trait;
use dataplane_spi::{
    DataSink, DataSource, FailureReason, Part, SpiError, StreamFailure, StreamResult,
};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::partition;

/// Parts sent per partition when no size is configured
pub const DEFAULT_PARTITION_SIZE: usize = 5;

/// Partitions in flight at once when no limit is configured
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Extension-specific logic for writing one partition of parts
#[async_trait]
pub trait PartTransfer: Send + Sync + 'static {
    async fn transfer_parts(&self, parts: Vec<Box<dyn Part>>) -> StreamResult<()>;

    /// Called once after every partition succeeded
    async fn complete(&self) -> StreamResult<()> {
        Ok(())
    }
}

/// A [`DataSink`] that partitions the source's parts and transfers every
/// partition on its own task.
///
/// At most `max_concurrency` partitions are transferred at the same time.
pub struct ParallelSink<T> {
    request_id: String,
    partition_size: usize,
    max_concurrency: usize,
    transfer: Arc<T>,
}

impl<T: PartTransfer> ParallelSink<T> {
    pub fn builder() -> ParallelSinkBuilder<T> {
        ParallelSinkBuilder::default()
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn partition_size(&self) -> usize {
        self.partition_size
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn part_transfer(&self) -> &T {
        &self.transfer
    }

    async fn transfer_from(&self, source: &dyn DataSource) -> StreamResult<()> {
        let parts = source.open_part_stream().await?;
        let part_count = parts.len();
        let partitions = partition(parts, self.partition_size);

        if partitions.is_empty() {
            debug!(request_id = %self.request_id, "Source produced no parts");
            return self.transfer.complete().await;
        }

        debug!(
            request_id = %self.request_id,
            "Transferring {} parts in {} partitions",
            part_count,
            partitions.len()
        );

        let permits = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();
        for chunk in partitions {
            let transfer = Arc::clone(&self.transfer);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| StreamFailure::error(format!("Partition not started: {}", e)))?;
                transfer.transfer_parts(chunk).await
            });
        }

        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(failure)) => failures.extend(failure.messages),
                Err(e) => failures.push(format!("Partition task failed: {}", e)),
            }
        }

        if !failures.is_empty() {
            error!(
                request_id = %self.request_id,
                "Transfer failed: {}",
                failures.join(", ")
            );
            return Err(StreamFailure::new(FailureReason::GeneralError, failures));
        }

        self.transfer.complete().await
    }
}

impl<T> std::fmt::Debug for ParallelSink<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParallelSink")
            .field("request_id", &self.request_id)
            .field("partition_size", &self.partition_size)
            .field("max_concurrency", &self.max_concurrency)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<T: PartTransfer> DataSink for ParallelSink<T> {
    async fn transfer(&self, source: Box<dyn DataSource>) -> StreamResult<()> {
        let result = self.transfer_from(source.as_ref()).await;
        if let Err(e) = source.close().await {
            warn!(request_id = %self.request_id, "Failed to close source: {}", e);
        }
        result
    }
}

/// Builder for [`ParallelSink`]
pub struct ParallelSinkBuilder<T> {
    request_id: Option<String>,
    partition_size: usize,
    max_concurrency: usize,
    transfer: Option<T>,
}

impl<T> Default for ParallelSinkBuilder<T> {
    fn default() -> Self {
        Self {
            request_id: None,
            partition_size: DEFAULT_PARTITION_SIZE,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            transfer: None,
        }
    }
}

impl<T: PartTransfer> ParallelSinkBuilder<T> {
    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn partition_size(mut self, partition_size: usize) -> Self {
        self.partition_size = partition_size;
        self
    }

    pub fn max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn transfer(mut self, transfer: T) -> Self {
        self.transfer = Some(transfer);
        self
    }

    pub fn build(self) -> Result<ParallelSink<T>, SpiError> {
        let request_id = self
            .request_id
            .ok_or_else(|| SpiError::build("requestId is required"))?;
        let transfer = self
            .transfer
            .ok_or_else(|| SpiError::build("transfer is required"))?;
        if self.partition_size == 0 {
            return Err(SpiError::build("partitionSize must be greater than zero"));
        }
        if self.max_concurrency == 0 {
            return Err(SpiError::build("maxConcurrency must be greater than zero"));
        }

        Ok(ParallelSink {
            request_id,
            partition_size: self.partition_size,
            max_concurrency: self.max_concurrency,
            transfer: Arc::new(transfer),
        })
    }
}
