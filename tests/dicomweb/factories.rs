use dataplane_spi::{
    DataAddress, DataFlowStartMessage, DataPlaneHttpClient, DataSinkFactory, DataSource,
    DataSourceFactory, HttpClientConfig, InMemoryVault, Part, SpiError,
};
use dicomweb_dataplane::schema;
use dicomweb_dataplane::testing::{sample_instance, MockPacs};
use dicomweb_dataplane::{DicomWebClient, DicomWebDataSinkFactory, DicomWebDataSourceFactory};
use std::sync::Arc;

fn build_client() -> DicomWebClient {
    DicomWebClient::new(Arc::new(
        DataPlaneHttpClient::new(HttpClientConfig::default()).unwrap(),
    ))
}

fn dicomweb_address(url: &str) -> DataAddress {
    DataAddress::builder()
        .type_(schema::TYPE)
        .property(schema::URL, url)
        .property(schema::USERNAME, "orthanc")
        .property(schema::PASSWORD, "orthanc")
        .build()
        .unwrap()
}

#[test]
fn source_factory_rejects_missing_address() {
    let factory = DicomWebDataSourceFactory::new(build_client(), Arc::new(InMemoryVault::new()));
    let request = DataFlowStartMessage::builder()
        .destination_data_address(dicomweb_address("http://pacs/dicomweb/studies"))
        .build();

    assert!(!factory.can_handle(&request));
    assert_eq!(
        factory.validate_request(&request).unwrap_err(),
        "Data address is null"
    );
}

#[test]
fn source_factory_rejects_missing_url() {
    let factory = DicomWebDataSourceFactory::new(build_client(), Arc::new(InMemoryVault::new()));
    let request = DataFlowStartMessage::builder()
        .source_data_address(DataAddress::new(schema::TYPE))
        .build();

    assert!(factory.can_handle(&request));
    assert_eq!(
        factory.validate_request(&request).unwrap_err(),
        "Failed to build DicomWebDataSource: url is required"
    );
    let err = factory.create_source(&request).err().unwrap();
    assert!(matches!(err, SpiError::Build(ref m) if m == "url is required"));
}

#[test]
fn factories_handle_only_dicomweb_addresses() {
    let vault = Arc::new(InMemoryVault::new());
    let source_factory = DicomWebDataSourceFactory::new(build_client(), vault.clone());
    let sink_factory = DicomWebDataSinkFactory::new(build_client(), vault, 5);

    let other = DataFlowStartMessage::builder()
        .source_data_address(DataAddress::new("HttpData"))
        .destination_data_address(DataAddress::new("AmazonS3"))
        .build();
    assert!(!source_factory.can_handle(&other));
    assert!(!sink_factory.can_handle(&other));

    assert_eq!(source_factory.supported_type(), "DicomWebData");
    assert_eq!(sink_factory.supported_type(), "DicomWebData");
}

#[test]
fn sink_factory_requires_password_or_secret() {
    let vault = Arc::new(InMemoryVault::new());
    let factory = DicomWebDataSinkFactory::new(build_client(), vault.clone(), 5);
    let address = DataAddress::builder()
        .type_(schema::TYPE)
        .property(schema::URL, "http://pacs/dicomweb/studies")
        .property(schema::USERNAME, "orthanc")
        .property(schema::SECRET_NAME, "pacs-password")
        .build()
        .unwrap();
    let request = DataFlowStartMessage::builder()
        .destination_data_address(address)
        .build();

    assert_eq!(
        factory.validate_request(&request).unwrap_err(),
        "Failed to build DicomWebDataSink: password is required"
    );

    vault.store_secret("pacs-password", "orthanc");
    assert!(factory.validate_request(&request).is_ok());
    assert!(factory.create_sink(&request).is_ok());
}

#[tokio::test]
async fn source_uses_vault_password_for_retrieval() {
    let pacs = MockPacs::start().await.unwrap();
    pacs.add_study("1.2.3", vec![sample_instance(0)]);

    let vault = Arc::new(InMemoryVault::new());
    vault.store_secret("pacs-password", "orthanc");
    let factory = DicomWebDataSourceFactory::new(build_client(), vault);

    let request = DataFlowStartMessage::builder()
        .source_data_address(
            DataAddress::builder()
                .type_(schema::TYPE)
                .property(schema::URL, pacs.study_url("1.2.3"))
                .property(schema::USERNAME, "orthanc")
                .property(schema::SECRET_NAME, "pacs-password")
                .property(schema::NAME, "study-1.2.3")
                .build()
                .unwrap(),
        )
        .build();

    let source = factory.create_source(&request).unwrap();
    let parts = source.open_part_stream().await.unwrap();

    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].name(), "study-1.2.3");
    assert_eq!(parts[0].media_type(), "application/dicom");
    assert_eq!(
        pacs.authorizations(),
        vec![Some("Basic b3J0aGFuYzpvcnRoYW5j".to_string())]
    );
}

#[tokio::test]
async fn source_failure_names_the_pacs() {
    let pacs = MockPacs::start().await.unwrap();
    let factory = DicomWebDataSourceFactory::new(build_client(), Arc::new(InMemoryVault::new()));
    let request = DataFlowStartMessage::builder()
        .source_data_address(dicomweb_address(&pacs.study_url("unknown")))
        .build();

    let source = factory.create_source(&request).unwrap();
    let failure = source.open_part_stream().await.err().unwrap();

    assert_eq!(
        failure.messages,
        vec!["Failed to retrieve data from PACS: Failed to execute WADO-RS: 404 Not Found".to_string()]
    );
}
