//! Tests for config.rs: defaults, validation and file loading

use lead_intake::config::{AppConfig, LoggingConfig};
use lead_intake::routing::MirrorRule;
use lead_intake::store::google::SpreadsheetRef;
use lead_intake::store::WorksheetSelector;
use std::io::Write;
use std::path::PathBuf;

#[test]
fn test_default_server_config() {
    let config = AppConfig::default();

    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 5000);
    assert_eq!(config.bind_address(), "0.0.0.0:5000");
}

#[test]
fn test_default_sheets_config() {
    let config = AppConfig::default();

    assert_eq!(
        config.sheets.spreadsheet_name,
        "Incorp Genius – Lead Qualification & Conversion Tracker"
    );
    assert_eq!(config.sheets.spreadsheet_id, None);
    assert_eq!(config.sheets.primary_worksheet, None);
    assert_eq!(config.request_timeout().as_secs(), 30);
}

#[test]
fn test_default_routing_sends_dattu_to_own_sheet() {
    let router = AppConfig::default().router();

    assert_eq!(router.route("Dattu"), Some("Dattu's leads"));
    assert_eq!(router.route("Not Assigned"), None);
}

#[test]
fn test_default_logging_config() {
    let LoggingConfig { level, file_path, format } = AppConfig::default().logging;

    assert_eq!(level, "info");
    assert_eq!(file_path, None);
    assert_eq!(format, "text");
}

#[test]
fn test_spreadsheet_id_takes_precedence_over_name() {
    let mut config = AppConfig::default();
    config.sheets.spreadsheet_id = Some("1AbC".to_string());

    assert!(matches!(config.spreadsheet_ref(), SpreadsheetRef::Id(id) if id == "1AbC"));
}

#[test]
fn test_name_may_be_empty_when_id_is_set() {
    let mut config = AppConfig::default();
    config.sheets.spreadsheet_name = String::new();
    assert!(config.validate().is_err());

    config.sheets.spreadsheet_id = Some("1AbC".to_string());
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_log_level() {
    let mut config = AppConfig::default();
    config.logging.level = "verbose".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_invalid_log_format() {
    let mut config = AppConfig::default();
    config.logging.format = "xml".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_mirror_rule_with_empty_worksheet() {
    let mut config = AppConfig::default();
    config.routing.mirrors = vec![MirrorRule::new("Asha", "  ")];
    assert!(config.validate().is_err());
}

#[test]
fn test_empty_primary_title_is_rejected() {
    let mut config = AppConfig::default();
    config.sheets.primary_worksheet = Some(String::new());
    assert!(config.validate().is_err());
}

#[test]
fn test_load_from_toml_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[sheets]
spreadsheet_id = "sheet-123"
primary_worksheet = "Master"

[[routing.mirrors]]
assignee = "Asha"
worksheet = "Asha leads"

[[routing.mirrors]]
assignee = "Dattu"
worksheet = "Dattu's leads"

[logging]
level = "debug"
format = "json"
"#
    )
    .unwrap();

    let config = AppConfig::load(Some(file.path())).unwrap();

    assert_eq!(config.sheets.spreadsheet_id.as_deref(), Some("sheet-123"));
    assert_eq!(config.primary_selector(), WorksheetSelector::Title("Master".to_string()));
    assert_eq!(config.routing.mirrors.len(), 2);
    assert_eq!(config.router().route("asha"), Some("Asha leads"));
    assert_eq!(config.logging.level, "debug");
    assert!(config.json_logs());
    // Untouched keys keep their defaults
    assert_eq!(config.sheets.request_timeout_secs, 30);
}

#[test]
fn test_load_rejects_invalid_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[logging]\nlevel = \"loud\"").unwrap();

    assert!(AppConfig::load(Some(file.path())).is_err());
}

#[test]
fn test_load_requires_explicit_file_to_exist() {
    let missing = PathBuf::from("/nonexistent/lead-intake.toml");
    assert!(AppConfig::load(Some(missing.as_path())).is_err());
}
