//! Config load validation tests for harbormaster-config.
// crates/harbormaster-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding, keys).
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::io::Write;
use std::path::Path;

use harbormaster_config::ConfigError;
use harbormaster_config::HarbormasterConfig;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

const VALID_CONFIG: &str = r#"
[storage]
data_dir = "/var/lib/harbormaster"

[tugboat]
base_url = "https://api.tugboat.example"
username = "svc-harbormaster"
password = "hunter2"

[tugboat.collector_urls]
"ET-0001" = "https://collector.example/i/abc"
"#;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn assert_invalid(result: Result<HarbormasterConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

#[test]
fn load_accepts_minimal_valid_config() {
    let file = write_config(VALID_CONFIG);
    let config = HarbormasterConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.storage.paths.policies, Path::new("docs/policies"));
    assert_eq!(config.tugboat.request_timeout_secs, 30);
    assert_eq!(config.tugboat.api_key_env, "TUGBOAT_API_KEY");
    assert_eq!(
        config.tugboat.collector_url("ET-0001"),
        Some("https://collector.example/i/abc")
    );
    assert_eq!(config.tugboat.collector_url("ET-0002"), None);
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    let path = Path::new(&long_path);
    assert_invalid(HarbormasterConfig::load(Some(path)), "config path exceeds max length")
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    let path = Path::new(&long_component);
    assert_invalid(HarbormasterConfig::load(Some(path)), "config path component too long")
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    let payload = vec![b'a'; 1_048_577];
    file.write_all(&payload).map_err(|err| err.to_string())?;
    assert_invalid(HarbormasterConfig::load(Some(file.path())), "config file exceeds size limit")
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF]).map_err(|err| err.to_string())?;
    assert_invalid(HarbormasterConfig::load(Some(file.path())), "config file must be utf-8")
}

#[test]
fn load_rejects_unknown_keys() -> TestResult {
    let file = write_config(&format!("{VALID_CONFIG}\n[surprise]\nkey = 1\n"));
    assert_invalid(HarbormasterConfig::load(Some(file.path())), "config parse error")
}

#[test]
fn load_rejects_invalid_base_url() -> TestResult {
    let file = write_config(
        r#"
[storage]
data_dir = "/data"

[tugboat]
base_url = "not a url"
username = "svc"
password = "p"
"#,
    );
    assert_invalid(HarbormasterConfig::load(Some(file.path())), "base_url must be a valid url")
}

#[test]
fn load_rejects_non_canonical_collector_key() -> TestResult {
    let file = write_config(
        r#"
[storage]
data_dir = "/data"

[tugboat]
base_url = "https://api.example"
username = "svc"
password = "p"

[tugboat.collector_urls]
"ET1" = "https://collector.example/i/x"
"#,
    );
    assert_invalid(
        HarbormasterConfig::load(Some(file.path())),
        "not a canonical task reference",
    )
}

#[test]
fn load_rejects_absolute_storage_override() -> TestResult {
    let file = write_config(
        r#"
[storage]
data_dir = "/data"

[storage.paths]
policies = "/abs/policies"

[tugboat]
base_url = "https://api.example"
username = "svc"
password = "p"
"#,
    );
    assert_invalid(HarbormasterConfig::load(Some(file.path())), "must be relative")
}

#[test]
fn debug_output_redacts_password() {
    let file = write_config(VALID_CONFIG);
    let config = HarbormasterConfig::load(Some(file.path())).unwrap();
    let rendered = format!("{:?}", config.tugboat);
    assert!(rendered.contains("<redacted>"));
    assert!(!rendered.contains("hunter2"));
}
