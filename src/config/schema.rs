//! Configuration schema types
//!
//! This module defines the TOML configuration structure for redcap-export.
//! Sections map one-to-one onto the layers of the crate: `[api]` configures
//! the transport, `[export]` describes the parameter set, `[retry]` the
//! caller-side retry policy, `[logging]` the observability setup.

use serde::{Deserialize, Serialize};

use crate::config::secret::SecretString;
use crate::domain::params::{ExportContent, ExportFormat, LabelMode, ParameterSet, RecordType};
use crate::domain::ValidationError;

/// Main redcap-export configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedcapExportConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// API endpoint and transport settings
    pub api: ApiConfig,

    /// Export request parameters
    pub export: ExportSettings,

    /// Retry policy for the export command
    #[serde(default)]
    pub retry: RetryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RedcapExportConfig {
    /// Validates the configuration
    ///
    /// Enumerated export values are validated by actually constructing a
    /// [`ParameterSet`], so a configuration that validates here can never
    /// fail parameter validation at export time.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid value found.
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.api.validate()?;
        self.export
            .to_parameter_set(self.api.token.clone())
            .map_err(|e| e.to_string())?;
        self.retry.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode (print the wire form instead of calling the API)
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// API endpoint and transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Full URL of the API endpoint (e.g. `https://redcap.example.edu/api/`)
    pub url: String,

    /// API authentication token (use `${REDCAP_API_TOKEN}` substitution)
    pub token: SecretString,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Maximum automatic redirects to follow
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// TLS certificate verification. Disabling this accepts any peer
    /// certificate and is an explicit opt-in for internal deployments with
    /// self-signed certificates; leave it on everywhere else.
    #[serde(default = "default_true")]
    pub tls_verify: bool,
}

impl ApiConfig {
    fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("api.url must not be empty".to_string());
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(format!(
                "api.url must be an http(s) URL, got '{}'",
                self.url
            ));
        }
        if self.timeout_seconds == 0 {
            return Err("api.timeout_seconds must be greater than zero".to_string());
        }
        if self.max_redirects > 50 {
            return Err(format!(
                "api.max_redirects must be at most 50, got {}",
                self.max_redirects
            ));
        }
        Ok(())
    }
}

/// Export request parameters as they appear in the TOML file
///
/// Enumerated values are kept as strings here and parsed into the domain
/// enumerations by [`to_parameter_set`](ExportSettings::to_parameter_set);
/// unknown spellings are rejected there, before any network I/O.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Export target (record, project, metadata, ...)
    pub content: String,

    /// Response serialization format (csv, json, xml)
    pub format: String,

    /// Record shape (flat or eav); required iff content = "record"
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,

    /// Raw values or labels for data (raw or label)
    #[serde(default = "default_raw")]
    pub raw_or_label: String,

    /// Raw values or labels for CSV headers (raw or label)
    #[serde(default = "default_raw")]
    pub raw_or_label_headers: String,

    /// Export checkbox labels instead of checked/unchecked
    #[serde(default)]
    pub export_checkbox_label: bool,

    /// Include survey identifier and timestamp fields
    #[serde(default)]
    pub export_survey_fields: bool,

    /// Include data access group assignments
    #[serde(default)]
    pub export_data_access_groups: bool,

    /// Format for API error responses (defaults to `format`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_format: Option<String>,

    /// Filter expression (e.g. `[age] > 30`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_logic: Option<String>,

    /// Record identifiers to export (empty = all)
    #[serde(default)]
    pub records: Vec<String>,

    /// Field names to export (empty = all)
    #[serde(default)]
    pub fields: Vec<String>,

    /// Instruments to export (empty = all)
    #[serde(default)]
    pub forms: Vec<String>,

    /// Unique event names to export (empty = all)
    #[serde(default)]
    pub events: Vec<String>,

    /// File to write the response body to (stdout when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
}

impl ExportSettings {
    /// Parses and validates these settings into a [`ParameterSet`]
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found, either from parsing an
    /// enumerated string or from cross-field validation in the builder.
    pub fn to_parameter_set(&self, token: SecretString) -> Result<ParameterSet, ValidationError> {
        let mut builder = ParameterSet::builder()
            .token_secret(token)
            .content(self.content.parse::<ExportContent>()?)
            .format(self.format.parse::<ExportFormat>()?)
            .raw_or_label(self.raw_or_label.parse::<LabelMode>()?)
            .raw_or_label_headers(parse_header_mode(&self.raw_or_label_headers)?)
            .export_checkbox_label(self.export_checkbox_label)
            .export_survey_fields(self.export_survey_fields)
            .export_data_access_groups(self.export_data_access_groups)
            .records(self.records.clone())
            .fields(self.fields.clone())
            .forms(self.forms.clone())
            .events(self.events.clone());

        if let Some(ref record_type) = self.record_type {
            builder = builder.record_type(record_type.parse::<RecordType>()?);
        }
        if let Some(ref return_format) = self.return_format {
            builder = builder.return_format(parse_return_format(return_format)?);
        }
        if let Some(ref filter) = self.filter_logic {
            builder = builder.filter_logic(filter.clone());
        }

        builder.build()
    }
}

/// Parse rawOrLabelHeaders, reporting errors under its own field name
fn parse_header_mode(value: &str) -> Result<LabelMode, ValidationError> {
    value
        .parse::<LabelMode>()
        .map_err(|e| ValidationError::new("rawOrLabelHeaders", e.reason))
}

/// Parse returnFormat, reporting errors under its own field name
fn parse_return_format(value: &str) -> Result<ExportFormat, ValidationError> {
    value
        .parse::<ExportFormat>()
        .map_err(|e| ValidationError::new("returnFormat", e.reason))
}

/// Retry configuration for the export command
///
/// Retries live in the CLI caller, never inside the client: one
/// `execute` call is always exactly one HTTP request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts (1 = no retries)
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Multiplier applied to the delay after each attempt
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_retries == 0 {
            return Err("retry.max_retries must be at least 1".to_string());
        }
        if self.backoff_multiplier < 1.0 {
            return Err("retry.backoff_multiplier must be at least 1.0".to_string());
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_log_path")]
    pub local_path: String,

    /// Log rotation (daily or hourly)
    #[serde(default = "default_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_log_path(),
            local_rotation: default_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        if self.local_enabled && self.local_path.is_empty() {
            return Err("logging.local_path must not be empty when file logging is enabled"
                .to_string());
        }
        if !["daily", "hourly"].contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be 'daily' or 'hourly'",
                self.local_rotation
            ));
        }
        Ok(())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_redirects() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_raw() -> String {
    "raw".to_string()
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_log_path() -> String {
    "logs".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}
