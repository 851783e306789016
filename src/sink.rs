//! STOW-RS data sink

use async_trait::async_trait;
use bytes::Bytes;
use dataplane_spi::{
    read_all, DataFlowStartMessage, DataSink, DataSinkFactory, DataSource, Part, SpiError,
    StreamFailure, StreamResult, Vault,
};
use dataplane_util::{ParallelSink, PartTransfer, DEFAULT_MAX_CONCURRENCY, DEFAULT_PARTITION_SIZE};
use std::sync::Arc;
use tracing::{debug, error};

use crate::client::{Credentials, DicomWebClient};
use crate::schema;
use crate::{DicomWebError, Result};

/// Writes one partition of parts with a single STOW-RS request
#[derive(Debug)]
pub struct DicomWebPartTransfer {
    url: String,
    credentials: Credentials,
    client: DicomWebClient,
}

impl DicomWebPartTransfer {
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PartTransfer for DicomWebPartTransfer {
    async fn transfer_parts(&self, parts: Vec<Box<dyn Part>>) -> StreamResult<()> {
        let mut instances: Vec<Bytes> = Vec::with_capacity(parts.len());
        for part in &parts {
            match read_all(part.as_ref()).await {
                Ok(data) => instances.push(data),
                Err(e) => {
                    error!("Error reading part {}: {}", part.name(), e);
                    return Err(StreamFailure::error("Error writing data"));
                }
            }
        }

        match self
            .client
            .stow_rs(&self.url, &self.credentials, instances)
            .await
        {
            Ok(response) => {
                debug!("STOW-RS response from {}: {}", self.url, response);
                Ok(())
            }
            Err(e) => {
                error!("Error writing DICOM data to endpoint {}: {}", self.url, e);
                Err(StreamFailure::error("Error writing data"))
            }
        }
    }
}

/// A data sink that stores DICOM data at a DICOMweb endpoint
#[derive(Debug)]
pub struct DicomWebDataSink(ParallelSink<DicomWebPartTransfer>);

impl DicomWebDataSink {
    pub fn builder() -> DicomWebDataSinkBuilder {
        DicomWebDataSinkBuilder::default()
    }

    pub fn url(&self) -> &str {
        self.0.part_transfer().url()
    }

    pub fn request_id(&self) -> &str {
        self.0.request_id()
    }

    pub fn partition_size(&self) -> usize {
        self.0.partition_size()
    }

    pub fn max_concurrency(&self) -> usize {
        self.0.max_concurrency()
    }
}

#[async_trait]
impl DataSink for DicomWebDataSink {
    async fn transfer(&self, source: Box<dyn DataSource>) -> StreamResult<()> {
        self.0.transfer(source).await
    }
}

pub struct DicomWebDataSinkBuilder {
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    client: Option<DicomWebClient>,
    request_id: Option<String>,
    partition_size: usize,
    max_concurrency: usize,
}

impl Default for DicomWebDataSinkBuilder {
    fn default() -> Self {
        Self {
            url: None,
            username: None,
            password: None,
            client: None,
            request_id: None,
            partition_size: DEFAULT_PARTITION_SIZE,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl DicomWebDataSinkBuilder {
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn client(mut self, client: DicomWebClient) -> Self {
        self.client = Some(client);
        self
    }

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

    pub fn build(self) -> Result<DicomWebDataSink> {
        let url = self
            .url
            .ok_or_else(|| DicomWebError::build("url is required"))?;
        url::Url::parse(&url)
            .map_err(|e| DicomWebError::build(format!("invalid url '{}': {}", url, e)))?;
        let username = self
            .username
            .ok_or_else(|| DicomWebError::build("username is required"))?;
        let password = self
            .password
            .ok_or_else(|| DicomWebError::build("password is required"))?;
        let client = self
            .client
            .ok_or_else(|| DicomWebError::build("dicomWebClient is required"))?;
        let request_id = self
            .request_id
            .ok_or_else(|| DicomWebError::build("requestId is required"))?;

        let transfer = DicomWebPartTransfer {
            url,
            credentials: Credentials::basic(username, password),
            client,
        };
        let sink = ParallelSink::builder()
            .request_id(request_id)
            .partition_size(self.partition_size)
            .max_concurrency(self.max_concurrency)
            .transfer(transfer)
            .build()?;
        Ok(DicomWebDataSink(sink))
    }
}

/// Instantiates [`DicomWebDataSink`]s for requests whose destination type is
/// [`schema::TYPE`]
pub struct DicomWebDataSinkFactory {
    client: DicomWebClient,
    vault: Arc<dyn Vault>,
    partition_size: usize,
    max_concurrency: usize,
}

impl DicomWebDataSinkFactory {
    pub fn new(client: DicomWebClient, vault: Arc<dyn Vault>, partition_size: usize) -> Self {
        Self {
            client,
            vault,
            partition_size,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Limit the partitions each created sink sends at once
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    fn build_sink(&self, request: &DataFlowStartMessage) -> Result<DicomWebDataSink> {
        let address = request
            .destination_data_address
            .as_ref()
            .ok_or_else(|| DicomWebError::build("Data address is null"))?;
        let credentials = Credentials::from_address(address, self.vault.as_ref());

        let mut builder = DicomWebDataSink::builder()
            .client(self.client.clone())
            .request_id(&request.id)
            .partition_size(self.partition_size)
            .max_concurrency(self.max_concurrency);
        if let Some(url) = address.get_string_property(schema::URL) {
            builder = builder.url(url);
        }
        if let Some(username) = credentials.username {
            builder = builder.username(username);
        }
        if let Some(password) = credentials.password {
            builder = builder.password(password);
        }
        builder.build()
    }
}

impl DataSinkFactory for DicomWebDataSinkFactory {
    fn supported_type(&self) -> &str {
        schema::TYPE
    }

    fn can_handle(&self, request: &DataFlowStartMessage) -> bool {
        request.destination_type() == Some(schema::TYPE)
    }

    fn validate_request(&self, request: &DataFlowStartMessage) -> std::result::Result<(), String> {
        if request.destination_data_address.is_none() {
            return Err("Data address is null".to_string());
        }
        self.build_sink(request)
            .map(|_| ())
            .map_err(|e| format!("Failed to build DicomWebDataSink: {}", e))
    }

    fn create_sink(
        &self,
        request: &DataFlowStartMessage,
    ) -> dataplane_spi::Result<Box<dyn DataSink>> {
        let sink = self.build_sink(request).map_err(SpiError::from)?;
        Ok(Box::new(sink))
    }
}
