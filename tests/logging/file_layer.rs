use dicomweb_dataplane::config::LoggingConfig;
use dicomweb_dataplane::logging::init_logging;
use tempfile::TempDir;

// Installs the global subscriber, so it is the only test in this binary
#[test]
fn file_layer_writes_plain_log_lines() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("dataplane.log");
    let config = LoggingConfig {
        level: "info".to_string(),
        log_to_file: true,
        log_file_path: log_path.display().to_string(),
    };

    init_logging(&config).unwrap();
    tracing::error!("stow endpoint unreachable");

    let content = std::fs::read_to_string(&log_path).unwrap();
    assert!(content.contains("stow endpoint unreachable"));
    assert!(content.contains("ERROR"));
    // No ANSI escape sequences in the file
    assert!(!content.contains('\u{1b}'));

    // A second subscriber cannot be installed
    assert!(init_logging(&LoggingConfig::default()).is_err());
}
