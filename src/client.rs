//! A client for interacting with a DICOMweb server

use base64::Engine;
use bytes::Bytes;
use dataplane_spi::{DataAddress, DataPlaneHttpClient, Vault};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::multipart::{self, MultipartError, MultipartPart};
use crate::schema::{DICOM_MEDIA_TYPE, PASSWORD, SECRET_NAME, USERNAME};
use crate::{DicomWebError, Result};

/// Accept header for WADO-RS instance retrieval
pub const WADO_ACCEPT: &str = "multipart/related; type=\"application/dicom\"";

/// Basic-auth credentials for a DICOMweb endpoint
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Self { username, password }
    }

    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new(Some(username.into()), Some(password.into()))
    }

    /// Read `username` and `password` from an address. A missing password is
    /// looked up in the vault under the address's `secretName`.
    pub fn from_address(address: &DataAddress, vault: &dyn Vault) -> Self {
        let username = address.get_string_property(USERNAME);
        let password = address.get_string_property(PASSWORD).or_else(|| {
            let secret_name = address.get_string_property(SECRET_NAME)?;
            let secret = vault.resolve_secret(&secret_name);
            if secret.is_none() {
                warn!("Secret '{}' not found in vault", secret_name);
            }
            secret
        });
        Self { username, password }
    }

    /// `Authorization` header value, only when a username is set
    pub fn authorization(&self) -> Option<String> {
        let username = self.username.as_deref()?;
        let password = self.password.as_deref().unwrap_or_default();
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", username, password));
        Some(format!("Basic {}", encoded))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Issues STOW-RS and WADO-RS requests over the shared data-plane HTTP client
#[derive(Debug, Clone)]
pub struct DicomWebClient {
    http: Arc<DataPlaneHttpClient>,
}

impl DicomWebClient {
    pub fn new(http: Arc<DataPlaneHttpClient>) -> Self {
        Self { http }
    }

    /// Store instances with a single multipart/related POST.
    ///
    /// Returns the response body of the server on success.
    pub async fn stow_rs(
        &self,
        url: &str,
        credentials: &Credentials,
        instances: Vec<Bytes>,
    ) -> Result<String> {
        let boundary = multipart::generate_boundary();
        let parts: Vec<MultipartPart> = instances
            .into_iter()
            .enumerate()
            .map(|(i, data)| {
                MultipartPart::new(data)
                    .with_header("Content-Type", DICOM_MEDIA_TYPE)
                    .with_header(
                        "Content-Disposition",
                        format!("form-data; name=\"file\"; filename=\"dicomfile-{}.dcm\"", i + 1),
                    )
            })
            .collect();
        let body = Bytes::from(multipart::encode_related(&boundary, &parts));
        let content_type = multipart::related_content_type(DICOM_MEDIA_TYPE, &boundary);
        let authorization = credentials.authorization();

        let response = self
            .http
            .execute(|client| {
                let mut request = client
                    .post(url)
                    .header(CONTENT_TYPE, content_type.as_str())
                    .header(ACCEPT, "application/json")
                    .body(body.clone());
                if let Some(auth) = &authorization {
                    request = request.header(AUTHORIZATION, auth.as_str());
                }
                request
            })
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DicomWebError::Upload(status.to_string()));
        }

        debug!(
            "HTTP request to {} was successful with status code {} and message {}",
            url,
            status.as_u16(),
            status.canonical_reason().unwrap_or_default()
        );
        Ok(response.text().await?)
    }

    /// Retrieve instances, one entry per DICOM object in the response
    pub async fn wado_rs(&self, url: &str, credentials: &Credentials) -> Result<Vec<Bytes>> {
        let authorization = credentials.authorization();

        let response = self
            .http
            .execute(|client| {
                let mut request = client.get(url).header(ACCEPT, WADO_ACCEPT);
                if let Some(auth) = &authorization {
                    request = request.header(AUTHORIZATION, auth.as_str());
                }
                request
            })
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DicomWebError::Retrieve(status.to_string()));
        }

        debug!(
            "HTTP request to {} was successful with status code {} and message {}",
            url,
            status.as_u16(),
            status.canonical_reason().unwrap_or_default()
        );

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.bytes().await?;

        split_instances(&content_type, body)
    }
}

/// Turn a WADO-RS response body into instance payloads
pub fn split_instances(content_type: &str, body: Bytes) -> Result<Vec<Bytes>> {
    if multipart::media_type(content_type) == DICOM_MEDIA_TYPE {
        return Ok(vec![body]);
    }

    let boundary = multipart::boundary_from_content_type(content_type)
        .ok_or_else(|| MultipartError::NoBoundaryParameter(content_type.to_string()))?;
    let parts = multipart::decode_related(&body, &boundary)?;
    Ok(parts.into_iter().map(|part| part.body).collect())
}
