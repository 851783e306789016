use axum::http::StatusCode;
use bytes::Bytes;
use dataplane_spi::{DataAddress, DataFlowStartMessage, FailureReason, HttpClientConfig};
use dicomweb_dataplane::schema;
use dicomweb_dataplane::testing::{sample_instance, MockPacs};
use dicomweb_dataplane::{Config, Runtime};

fn runtime_with_partition_size(partition_size: usize) -> Runtime {
    let mut config = Config::default();
    config.transfer.partition_size = partition_size;
    config.http = HttpClientConfig {
        max_retries: 0,
        ..Default::default()
    };
    config
        .secrets
        .insert("stow-password".to_string(), "orthanc".to_string());
    Runtime::new(config).unwrap()
}

fn flow(pacs: &MockPacs, study_uid: &str) -> DataFlowStartMessage {
    DataFlowStartMessage::builder()
        .process_id("process-1")
        .transfer_type(schema::TRANSFERTYPE_PUSH)
        .source_data_address(
            DataAddress::builder()
                .type_(schema::TYPE)
                .property(schema::URL, pacs.study_url(study_uid))
                .property(schema::USERNAME, "orthanc")
                .property(schema::PASSWORD, "orthanc")
                .build()
                .unwrap(),
        )
        .destination_data_address(
            DataAddress::builder()
                .type_(schema::TYPE)
                .property(schema::URL, pacs.stow_url())
                .property(schema::USERNAME, "orthanc")
                .property(schema::SECRET_NAME, "stow-password")
                .build()
                .unwrap(),
        )
        .build()
}

fn sorted(mut instances: Vec<Bytes>) -> Vec<Bytes> {
    instances.sort();
    instances
}

#[tokio::test]
async fn transfers_every_instance_in_partitions() {
    let pacs = MockPacs::start().await.unwrap();
    let instances: Vec<Bytes> = (0..7).map(sample_instance).collect();
    pacs.add_study("1.2.3", instances.clone());

    let runtime = runtime_with_partition_size(3);
    runtime.transfer(&flow(&pacs, "1.2.3")).await.unwrap();

    let uploads = pacs.uploads();
    let mut sizes: Vec<usize> = uploads.iter().map(|u| u.parts.len()).collect();
    sizes.sort();
    assert_eq!(sizes, vec![1, 3, 3]);
    assert_eq!(sorted(pacs.stored_instances()), sorted(instances));

    // One WADO-RS request plus one STOW-RS request per partition, all authenticated
    let authorizations = pacs.authorizations();
    assert_eq!(authorizations.len(), 4);
    assert!(authorizations
        .iter()
        .all(|a| a.as_deref() == Some("Basic b3J0aGFuYzpvcnRoYW5j")));
}

#[tokio::test]
async fn empty_study_transfers_nothing() {
    let pacs = MockPacs::start().await.unwrap();
    pacs.add_study("empty", Vec::new());

    let runtime = runtime_with_partition_size(5);
    runtime.transfer(&flow(&pacs, "empty")).await.unwrap();

    assert!(pacs.uploads().is_empty());
}

#[tokio::test]
async fn stow_failures_are_aggregated_per_partition() {
    let pacs = MockPacs::start().await.unwrap();
    pacs.add_study("1.2.3", (0..4).map(sample_instance).collect());
    pacs.fail_store_with(StatusCode::SERVICE_UNAVAILABLE);

    let runtime = runtime_with_partition_size(2);
    let failure = runtime.transfer(&flow(&pacs, "1.2.3")).await.unwrap_err();

    assert_eq!(failure.reason, FailureReason::GeneralError);
    assert_eq!(
        failure.messages,
        vec!["Error writing data".to_string(), "Error writing data".to_string()]
    );
    assert!(pacs.uploads().is_empty());
}

#[tokio::test]
async fn wado_failure_stops_the_transfer() {
    let pacs = MockPacs::start().await.unwrap();
    pacs.fail_retrieve_with(StatusCode::UNAUTHORIZED);

    let runtime = runtime_with_partition_size(5);
    let failure = runtime.transfer(&flow(&pacs, "1.2.3")).await.unwrap_err();

    assert_eq!(
        failure.failure_detail(),
        "Failed to retrieve data from PACS: Failed to execute WADO-RS: 401 Unauthorized"
    );
    assert!(pacs.uploads().is_empty());
}

#[tokio::test]
async fn invalid_flow_is_rejected_before_transfer() {
    let pacs = MockPacs::start().await.unwrap();
    let mut request = flow(&pacs, "1.2.3");
    request.destination_data_address = Some(DataAddress::new(schema::TYPE));

    let runtime = runtime_with_partition_size(5);
    let failure = runtime.transfer(&request).await.unwrap_err();

    assert_eq!(
        failure.messages,
        vec!["Failed to build DicomWebDataSink: url is required".to_string()]
    );
    assert!(pacs.authorizations().is_empty());
}

#[tokio::test]
async fn flow_message_from_json_is_transferred() {
    let pacs = MockPacs::start().await.unwrap();
    pacs.add_study("4.5.6", vec![sample_instance(1), sample_instance(2)]);

    let json = serde_json::json!({
        "id": "flow-json",
        "processId": "process-json",
        "sourceDataAddress": {
            "type": "DicomWebData",
            "url": pacs.study_url("4.5.6"),
        },
        "destinationDataAddress": {
            "type": "DicomWebData",
            "url": pacs.stow_url(),
            "username": "orthanc",
            "password": "orthanc",
        },
    });
    let request: DataFlowStartMessage = serde_json::from_value(json).unwrap();

    let runtime = runtime_with_partition_size(5);
    runtime.transfer(&request).await.unwrap();

    assert_eq!(pacs.uploads().len(), 1);
    assert_eq!(pacs.stored_instances().len(), 2);
}
