//! In-process DICOMweb server for tests
//!
//! Serves WADO-RS studies as `multipart/related` bodies and records every
//! STOW-RS upload together with the request headers.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::multipart::{self, MultipartPart};
use crate::schema::DICOM_MEDIA_TYPE;

/// A STOW-RS request as received by [`MockPacs`]
#[derive(Debug, Clone)]
pub struct StowUpload {
    pub content_type: String,
    pub accept: Option<String>,
    pub authorization: Option<String>,
    pub parts: Vec<MultipartPart>,
}

#[derive(Default)]
struct MockPacsState {
    studies: Mutex<HashMap<String, Vec<Bytes>>>,
    instances: Mutex<HashMap<String, Bytes>>,
    uploads: Mutex<Vec<StowUpload>>,
    authorizations: Mutex<Vec<Option<String>>>,
    wado_failure: Mutex<Option<StatusCode>>,
    stow_failure: Mutex<Option<StatusCode>>,
}

impl MockPacsState {
    fn record_authorization(&self, headers: &HeaderMap) -> Option<String> {
        let authorization = header_value(headers, header::AUTHORIZATION);
        lock(&self.authorizations).push(authorization.clone());
        authorization
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// A DICOMweb server bound to an ephemeral localhost port.
///
/// The server task is aborted when the value is dropped.
pub struct MockPacs {
    base_url: String,
    state: Arc<MockPacsState>,
    handle: JoinHandle<()>,
}

impl MockPacs {
    pub async fn start() -> std::io::Result<Self> {
        let state = Arc::new(MockPacsState::default());
        let app = Router::new()
            .route("/dicomweb/studies/{study_uid}", get(retrieve_study))
            .route("/dicomweb/instances/{sop_uid}", get(retrieve_instance))
            .route("/dicomweb/studies", post(store_instances))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Mock PACS stopped: {}", e);
            }
        });

        Ok(Self {
            base_url: format!("http://{}", addr),
            state,
            handle,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// WADO-RS URL of a study
    pub fn study_url(&self, study_uid: &str) -> String {
        format!("{}/dicomweb/studies/{}", self.base_url, study_uid)
    }

    /// URL answering with a single `application/dicom` body
    pub fn instance_url(&self, sop_uid: &str) -> String {
        format!("{}/dicomweb/instances/{}", self.base_url, sop_uid)
    }

    /// STOW-RS URL
    pub fn stow_url(&self) -> String {
        format!("{}/dicomweb/studies", self.base_url)
    }

    pub fn add_study(&self, study_uid: impl Into<String>, instances: Vec<Bytes>) {
        lock(&self.state.studies).insert(study_uid.into(), instances);
    }

    pub fn add_instance(&self, sop_uid: impl Into<String>, data: Bytes) {
        lock(&self.state.instances).insert(sop_uid.into(), data);
    }

    /// Answer every WADO-RS request with `status`
    pub fn fail_retrieve_with(&self, status: StatusCode) {
        *lock(&self.state.wado_failure) = Some(status);
    }

    /// Answer every STOW-RS request with `status`
    pub fn fail_store_with(&self, status: StatusCode) {
        *lock(&self.state.stow_failure) = Some(status);
    }

    pub fn uploads(&self) -> Vec<StowUpload> {
        lock(&self.state.uploads).clone()
    }

    /// Payloads of every uploaded part in arrival order
    pub fn stored_instances(&self) -> Vec<Bytes> {
        lock(&self.state.uploads)
            .iter()
            .flat_map(|upload| upload.parts.iter().map(|part| part.body.clone()))
            .collect()
    }

    /// `Authorization` headers of all requests, `None` where absent
    pub fn authorizations(&self) -> Vec<Option<String>> {
        lock(&self.state.authorizations).clone()
    }
}

impl Drop for MockPacs {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn retrieve_study(
    State(state): State<Arc<MockPacsState>>,
    Path(study_uid): Path<String>,
    headers: HeaderMap,
) -> Response {
    state.record_authorization(&headers);
    if let Some(status) = *lock(&state.wado_failure) {
        return status.into_response();
    }
    let Some(instances) = lock(&state.studies).get(&study_uid).cloned() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let boundary = multipart::generate_boundary();
    let parts: Vec<MultipartPart> = instances
        .into_iter()
        .map(|data| MultipartPart::new(data).with_header("Content-Type", DICOM_MEDIA_TYPE))
        .collect();
    let body = multipart::encode_related(&boundary, &parts);

    (
        [(
            header::CONTENT_TYPE,
            multipart::related_content_type(DICOM_MEDIA_TYPE, &boundary),
        )],
        body,
    )
        .into_response()
}

async fn retrieve_instance(
    State(state): State<Arc<MockPacsState>>,
    Path(sop_uid): Path<String>,
    headers: HeaderMap,
) -> Response {
    state.record_authorization(&headers);
    if let Some(status) = *lock(&state.wado_failure) {
        return status.into_response();
    }
    match lock(&state.instances).get(&sop_uid).cloned() {
        Some(data) => ([(header::CONTENT_TYPE, DICOM_MEDIA_TYPE)], data).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn store_instances(
    State(state): State<Arc<MockPacsState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let authorization = state.record_authorization(&headers);
    if let Some(status) = *lock(&state.stow_failure) {
        return status.into_response();
    }

    let content_type = header_value(&headers, header::CONTENT_TYPE).unwrap_or_default();
    let Some(boundary) = multipart::boundary_from_content_type(&content_type) else {
        return (StatusCode::BAD_REQUEST, "missing boundary").into_response();
    };
    let parts = match multipart::decode_related(&body, &boundary) {
        Ok(parts) => parts,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let stored = parts.len();
    lock(&state.uploads).push(StowUpload {
        content_type,
        accept: header_value(&headers, header::ACCEPT),
        authorization,
        parts,
    });

    Json(json!({ "stored": stored })).into_response()
}

/// A small Part 10 shaped payload: preamble, `DICM` magic and an index
/// followed by bytes that look like MIME line breaks and delimiters.
pub fn sample_instance(index: usize) -> Bytes {
    let mut data = vec![0u8; 128];
    data.extend_from_slice(b"DICM");
    data.extend_from_slice(format!("instance-{}", index).as_bytes());
    data.extend_from_slice(b"\r\n--\r\n\n");
    data.push((index % 256) as u8);
    Bytes::from(data)
}
