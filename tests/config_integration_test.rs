//! Integration tests for configuration loading and validation
//!
//! Note: Tests that modify environment variables are serialized through a
//! mutex to avoid interference between tests.

use redcap_export::config::load_config;
use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn cleanup_env_vars() {
    std::env::remove_var("REDCAP_API_URL");
    std::env::remove_var("REDCAP_API_TOKEN");
    std::env::remove_var("REDCAP_API_TLS_VERIFY");
    std::env::remove_var("REDCAP_EXPORT_CONTENT");
    std::env::remove_var("REDCAP_EXPORT_FORMAT");
    std::env::remove_var("REDCAP_RETRY_MAX_RETRIES");
    std::env::remove_var("TEST_REDCAP_TOKEN");
}

fn write_temp_config(contents: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().expect("temp file");
    temp_file
        .write_all(contents.as_bytes())
        .expect("write config");
    temp_file.flush().expect("flush config");
    temp_file
}

#[test]
fn loads_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_temp_config(
        r#"
[application]
log_level = "debug"
dry_run = false

[api]
url = "https://redcap.example.edu/api/"
token = "570BB42B2217DBA7BB6F2146B4FE15D3"
timeout_seconds = 60
max_redirects = 5
tls_verify = true

[export]
content = "record"
format = "csv"
type = "flat"
raw_or_label = "raw"
raw_or_label_headers = "label"
export_checkbox_label = false
forms = ["blackthorn_fmri"]
events = ["4_blackthorn_arm_1"]

[retry]
max_retries = 5
initial_delay_ms = 500

[logging]
local_enabled = false
"#,
    );

    let config = load_config(temp_file.path()).expect("config loads");
    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.api.url, "https://redcap.example.edu/api/");
    assert_eq!(config.api.timeout_seconds, 60);
    assert_eq!(config.api.max_redirects, 5);
    assert_eq!(config.export.forms, vec!["blackthorn_fmri"]);
    assert_eq!(config.retry.max_retries, 5);
    assert_eq!(config.retry.initial_delay_ms, 500);
}

#[test]
fn token_substituted_from_environment() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TEST_REDCAP_TOKEN", "SECRET_FROM_ENV");

    let temp_file = write_temp_config(
        r#"
[api]
url = "https://redcap.example.edu/api/"
token = "${TEST_REDCAP_TOKEN}"

[export]
content = "version"
format = "json"
"#,
    );

    let config = load_config(temp_file.path()).expect("config loads");
    assert_eq!(config.api.token.expose_secret().as_ref(), "SECRET_FROM_ENV");

    cleanup_env_vars();
}

#[test]
fn missing_substitution_variable_fails_loudly() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_temp_config(
        r#"
[api]
url = "https://redcap.example.edu/api/"
token = "${TEST_REDCAP_TOKEN}"

[export]
content = "version"
format = "json"
"#,
    );

    let err = load_config(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("TEST_REDCAP_TOKEN"));
}

#[test]
fn env_overrides_take_precedence_over_file_values() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("REDCAP_EXPORT_CONTENT", "metadata");
    std::env::set_var("REDCAP_EXPORT_FORMAT", "json");
    std::env::set_var("REDCAP_RETRY_MAX_RETRIES", "7");

    let temp_file = write_temp_config(
        r#"
[api]
url = "https://redcap.example.edu/api/"
token = "ABC"

[export]
content = "version"
format = "csv"
"#,
    );

    let config = load_config(temp_file.path()).expect("config loads");
    assert_eq!(config.export.content, "metadata");
    assert_eq!(config.export.format, "json");
    assert_eq!(config.retry.max_retries, 7);

    cleanup_env_vars();
}

#[test]
fn invalid_export_enumeration_fails_validation() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_temp_config(
        r#"
[api]
url = "https://redcap.example.edu/api/"
token = "ABC"

[export]
content = "recordz"
format = "csv"
"#,
    );

    let err = load_config(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("content"));
}

#[test]
fn tls_verification_defaults_on() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_temp_config(
        r#"
[api]
url = "https://redcap.example.edu/api/"
token = "ABC"

[export]
content = "version"
format = "json"
"#,
    );

    let config = load_config(temp_file.path()).expect("config loads");
    assert!(config.api.tls_verify);
}

#[test]
fn record_type_required_for_record_content() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_temp_config(
        r#"
[api]
url = "https://redcap.example.edu/api/"
token = "ABC"

[export]
content = "record"
format = "csv"
"#,
    );

    let err = load_config(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("type"));
}
