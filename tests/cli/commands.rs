use clap::Parser;
use dicomweb_dataplane::cli::{Cli, Cmd};
use dicomweb_dataplane::testing::{sample_instance, MockPacs};
use dicomweb_dataplane::Runtime;
use serde_json::json;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn parse(args: &[&str]) -> Cli {
    let mut argv = vec!["dicomweb-dataplane"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

#[test]
fn parses_subcommands_and_config() {
    let cli = parse(&["--config", "dataplane.toml", "validate", "--flow", "flow.json"]);
    assert_eq!(cli.config, Some(PathBuf::from("dataplane.toml")));
    assert!(matches!(cli.cmd, Cmd::Validate { ref flow } if flow == &PathBuf::from("flow.json")));

    assert!(Cli::try_parse_from(["dicomweb-dataplane", "transfer"]).is_err());
}

#[tokio::test]
async fn validate_fails_for_invalid_flow() {
    let dir = TempDir::new().unwrap();
    let flow = write_file(
        &dir,
        "flow.json",
        &json!({
            "id": "flow-1",
            "sourceDataAddress": { "type": "DicomWebData" },
            "destinationDataAddress": { "type": "DicomWebData" },
        })
        .to_string(),
    );
    let cli = parse(&["validate", "--flow", flow.to_str().unwrap()]);
    let runtime = Runtime::new(cli.load_config().unwrap()).unwrap();

    let err = cli.cmd.execute(&runtime).await.unwrap_err();

    let message = err.to_string();
    assert!(message.contains("Failed to build DicomWebDataSource: url is required"));
    assert!(message.contains("Failed to build DicomWebDataSink: url is required"));
}

#[tokio::test]
async fn unreadable_flow_and_config_fail() {
    let dir = TempDir::new().unwrap();
    let garbage = write_file(&dir, "flow.json", "not json");
    let runtime = Runtime::new(Default::default()).unwrap();

    let cli = parse(&["validate", "--flow", garbage.to_str().unwrap()]);
    let err = cli.cmd.execute(&runtime).await.unwrap_err();
    assert!(err.to_string().starts_with("parsing flow"));

    let cli = parse(&["--config", "/nonexistent/dataplane.toml", "types"]);
    assert!(cli.load_config().is_err());
}

#[tokio::test]
async fn transfer_and_types_succeed() {
    let pacs = MockPacs::start().await.unwrap();
    pacs.add_study("1.2.3", vec![sample_instance(0), sample_instance(1)]);

    let dir = TempDir::new().unwrap();
    let config = write_file(&dir, "dataplane.toml", "[transfer]\npartition_size = 1\n");
    let flow = write_file(
        &dir,
        "flow.json",
        &json!({
            "id": "flow-2",
            "sourceDataAddress": { "type": "DicomWebData", "url": pacs.study_url("1.2.3") },
            "destinationDataAddress": {
                "type": "DicomWebData",
                "url": pacs.stow_url(),
                "username": "orthanc",
                "password": "orthanc",
            },
        })
        .to_string(),
    );

    let cli = parse(&[
        "--config",
        config.to_str().unwrap(),
        "transfer",
        "--flow",
        flow.to_str().unwrap(),
    ]);
    let runtime = Runtime::new(cli.load_config().unwrap()).unwrap();

    let output = cli.cmd.execute(&runtime).await.unwrap();
    assert_eq!(output, vec!["Transfer flow-2 completed".to_string()]);
    assert_eq!(pacs.uploads().len(), 2);

    let output = Cmd::Types.execute(&runtime).await.unwrap();
    assert_eq!(
        output,
        vec![
            "sources: DicomWebData".to_string(),
            "sinks: DicomWebData".to_string()
        ]
    );
}
