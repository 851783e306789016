//! WADO-RS data source

use async_trait::async_trait;
use bytes::Bytes;
use dataplane_spi::{
    DataFlowStartMessage, DataSource, DataSourceFactory, Part, PartStream, SpiError,
    StreamFailure, StreamResult, Vault,
};
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::debug;

use crate::client::{Credentials, DicomWebClient};
use crate::schema::{self, DEFAULT_SOURCE_NAME, DICOM_MEDIA_TYPE};
use crate::{DicomWebError, Result};

/// A data source that reads DICOM data from a DICOMweb endpoint
#[derive(Debug)]
pub struct DicomWebDataSource {
    name: String,
    url: String,
    credentials: Credentials,
    request_id: String,
    client: DicomWebClient,
}

impl DicomWebDataSource {
    pub fn builder() -> DicomWebDataSourceBuilder {
        DicomWebDataSourceBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

#[async_trait]
impl DataSource for DicomWebDataSource {
    async fn open_part_stream(&self) -> StreamResult<Vec<Box<dyn Part>>> {
        debug!(request_id = %self.request_id, "Executing PACS request: {}", self.url);

        match self.client.wado_rs(&self.url, &self.credentials).await {
            Ok(instances) => Ok(instances
                .into_iter()
                .map(|data| {
                    Box::new(DicomWebPart::new(self.name.clone(), data, DICOM_MEDIA_TYPE))
                        as Box<dyn Part>
                })
                .collect()),
            Err(e) => Err(StreamFailure::error(format!(
                "Failed to retrieve data from PACS: {}",
                e
            ))),
        }
    }
}

/// One retrieved DICOM instance
#[derive(Debug, Clone)]
pub struct DicomWebPart {
    name: String,
    content: Bytes,
    media_type: String,
}

impl DicomWebPart {
    pub fn new(name: impl Into<String>, content: Bytes, media_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content,
            media_type: media_type.into(),
        }
    }
}

impl Part for DicomWebPart {
    fn name(&self) -> &str {
        &self.name
    }

    fn media_type(&self) -> &str {
        &self.media_type
    }

    fn open_stream(&self) -> dataplane_spi::Result<PartStream> {
        let content = self.content.clone();
        Ok(stream::once(async move { Ok(content) }).boxed())
    }
}

#[derive(Debug, Default)]
pub struct DicomWebDataSourceBuilder {
    name: Option<String>,
    url: Option<String>,
    credentials: Credentials,
    request_id: Option<String>,
    client: Option<DicomWebClient>,
}

impl DicomWebDataSourceBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn client(mut self, client: DicomWebClient) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> Result<DicomWebDataSource> {
        let request_id = self
            .request_id
            .ok_or_else(|| DicomWebError::build("requestId is required"))?;
        let client = self
            .client
            .ok_or_else(|| DicomWebError::build("dicomWebClient is required"))?;
        let url = self
            .url
            .ok_or_else(|| DicomWebError::build("url is required"))?;
        url::Url::parse(&url)
            .map_err(|e| DicomWebError::build(format!("invalid url '{}': {}", url, e)))?;

        Ok(DicomWebDataSource {
            name: self.name.unwrap_or_else(|| DEFAULT_SOURCE_NAME.to_string()),
            url,
            credentials: self.credentials,
            request_id,
            client,
        })
    }
}

/// Instantiates [`DicomWebDataSource`]s for requests whose source type is
/// [`schema::TYPE`]
pub struct DicomWebDataSourceFactory {
    client: DicomWebClient,
    vault: Arc<dyn Vault>,
}

impl DicomWebDataSourceFactory {
    pub fn new(client: DicomWebClient, vault: Arc<dyn Vault>) -> Self {
        Self { client, vault }
    }

    fn build_source(&self, request: &DataFlowStartMessage) -> Result<DicomWebDataSource> {
        let address = request
            .source_data_address
            .as_ref()
            .ok_or_else(|| DicomWebError::build("Data address is null"))?;

        let mut builder = DicomWebDataSource::builder()
            .client(self.client.clone())
            .request_id(&request.id)
            .name(address.get_string_property_or(schema::NAME, DEFAULT_SOURCE_NAME))
            .credentials(Credentials::from_address(address, self.vault.as_ref()));
        if let Some(url) = address.get_string_property(schema::URL) {
            builder = builder.url(url);
        }
        builder.build()
    }
}

impl DataSourceFactory for DicomWebDataSourceFactory {
    fn supported_type(&self) -> &str {
        schema::TYPE
    }

    fn can_handle(&self, request: &DataFlowStartMessage) -> bool {
        request.source_type() == Some(schema::TYPE)
    }

    fn validate_request(&self, request: &DataFlowStartMessage) -> std::result::Result<(), String> {
        if request.source_data_address.is_none() {
            return Err("Data address is null".to_string());
        }
        self.build_source(request)
            .map(|_| ())
            .map_err(|e| format!("Failed to build DicomWebDataSource: {}", e))
    }

    fn create_source(
        &self,
        request: &DataFlowStartMessage,
    ) -> dataplane_spi::Result<Box<dyn DataSource>> {
        let source = self.build_source(request).map_err(SpiError::from)?;
        Ok(Box::new(source))
    }
}
