use axum::http::StatusCode;
use bytes::Bytes;
use dataplane_spi::{DataPlaneHttpClient, HttpClientConfig};
use dicomweb_dataplane::testing::{sample_instance, MockPacs};
use dicomweb_dataplane::{Credentials, DicomWebClient, DicomWebError};
use std::sync::Arc;

fn build_client() -> DicomWebClient {
    let config = HttpClientConfig {
        max_retries: 0,
        ..Default::default()
    };
    DicomWebClient::new(Arc::new(DataPlaneHttpClient::new(config).unwrap()))
}

#[tokio::test]
async fn wado_rs_returns_one_payload_per_part() {
    let pacs = MockPacs::start().await.unwrap();
    let instances: Vec<Bytes> = (0..3).map(sample_instance).collect();
    pacs.add_study("1.2.3", instances.clone());

    let client = build_client();
    let retrieved = client
        .wado_rs(&pacs.study_url("1.2.3"), &Credentials::basic("orthanc", "orthanc"))
        .await
        .unwrap();

    assert_eq!(retrieved, instances);
    assert_eq!(
        pacs.authorizations(),
        vec![Some("Basic b3J0aGFuYzpvcnRoYW5j".to_string())]
    );
}

#[tokio::test]
async fn wado_rs_accepts_single_dicom_body() {
    let pacs = MockPacs::start().await.unwrap();
    pacs.add_instance("9.9", sample_instance(42));

    let retrieved = build_client()
        .wado_rs(&pacs.instance_url("9.9"), &Credentials::default())
        .await
        .unwrap();

    assert_eq!(retrieved, vec![sample_instance(42)]);
    // No username, no Authorization header
    assert_eq!(pacs.authorizations(), vec![None]);
}

#[tokio::test]
async fn wado_rs_not_found_is_a_retrieve_error() {
    let pacs = MockPacs::start().await.unwrap();

    let err = build_client()
        .wado_rs(&pacs.study_url("missing"), &Credentials::default())
        .await
        .unwrap_err();

    assert!(matches!(err, DicomWebError::Retrieve(_)));
    assert_eq!(err.to_string(), "Failed to execute WADO-RS: 404 Not Found");
}

#[tokio::test]
async fn stow_rs_posts_multipart_related_body() {
    let pacs = MockPacs::start().await.unwrap();
    let instances: Vec<Bytes> = (0..2).map(sample_instance).collect();

    let response = build_client()
        .stow_rs(
            &pacs.stow_url(),
            &Credentials::basic("user", "pass"),
            instances.clone(),
        )
        .await
        .unwrap();
    assert_eq!(response, r#"{"stored":2}"#);

    let uploads = pacs.uploads();
    assert_eq!(uploads.len(), 1);
    let upload = &uploads[0];
    assert!(upload
        .content_type
        .starts_with("multipart/related; type=\"application/dicom\"; boundary="));
    assert_eq!(upload.accept.as_deref(), Some("application/json"));
    assert!(upload.authorization.is_some());

    let filenames: Vec<&str> = upload
        .parts
        .iter()
        .filter_map(|part| part.header("content-disposition"))
        .collect();
    assert_eq!(
        filenames,
        vec![
            "form-data; name=\"file\"; filename=\"dicomfile-1.dcm\"",
            "form-data; name=\"file\"; filename=\"dicomfile-2.dcm\"",
        ]
    );
    assert!(upload
        .parts
        .iter()
        .all(|part| part.content_type() == Some("application/dicom")));
    assert_eq!(pacs.stored_instances(), instances);
}

#[tokio::test]
async fn stow_rs_server_error_is_an_upload_error() {
    let pacs = MockPacs::start().await.unwrap();
    pacs.fail_store_with(StatusCode::INTERNAL_SERVER_ERROR);

    let err = build_client()
        .stow_rs(&pacs.stow_url(), &Credentials::default(), vec![sample_instance(0)])
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Failed to upload file: 500 Internal Server Error"
    );
    assert!(!err.is_recoverable());
}

#[tokio::test]
async fn unreachable_server_is_recoverable() {
    // Reserve a port, then release it so nothing is listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = build_client()
        .wado_rs(
            &format!("http://{}/dicomweb/studies/1.2.3", addr),
            &Credentials::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DicomWebError::Http(_)), "unexpected error: {:?}", err);
    assert!(err
        .to_string()
        .starts_with("Exception occurred during HTTP request: "));
    assert!(err.is_recoverable(), "unexpected error: {}", err);
}

#[tokio::test]
async fn stow_rs_connection_failure_is_an_http_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = build_client()
        .stow_rs(
            &format!("http://{}/dicomweb/studies", addr),
            &Credentials::basic("orthanc", "orthanc"),
            vec![sample_instance(0)],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DicomWebError::Http(_)), "unexpected error: {:?}", err);
}
