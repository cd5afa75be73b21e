//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::RedcapExportConfig;
use crate::config::secret::secret_string;
use crate::domain::errors::RedcapError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`RedcapExportConfig`]
/// 4. Applies environment variable overrides (`REDCAP_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use redcap_export::config::loader::load_config;
///
/// let config = load_config("redcap-export.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<RedcapExportConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(RedcapError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        RedcapError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    // Perform environment variable substitution
    let contents = substitute_env_vars(&contents)?;

    // Parse TOML
    let mut config: RedcapExportConfig = toml::from_str(&contents)
        .map_err(|e| RedcapError::Configuration(format!("Failed to parse TOML: {e}")))?;

    // Apply environment variable overrides
    apply_env_overrides(&mut config);

    // Validate configuration
    config.validate().map_err(|e| {
        RedcapError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are left untouched so documented placeholders don't require
/// the variable to exist.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| RedcapError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(RedcapError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the `REDCAP_*` prefix
///
/// Environment variables follow the pattern `REDCAP_<SECTION>_<KEY>`,
/// for example `REDCAP_API_URL` or `REDCAP_EXPORT_CONTENT`.
fn apply_env_overrides(config: &mut RedcapExportConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("REDCAP_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("REDCAP_APPLICATION_DRY_RUN") {
        config.application.dry_run = val.parse().unwrap_or(false);
    }

    // API overrides
    if let Ok(val) = std::env::var("REDCAP_API_URL") {
        config.api.url = val;
    }
    if let Ok(val) = std::env::var("REDCAP_API_TOKEN") {
        config.api.token = secret_string(val);
    }
    if let Ok(val) = std::env::var("REDCAP_API_TIMEOUT_SECONDS") {
        if let Ok(timeout) = val.parse() {
            config.api.timeout_seconds = timeout;
        }
    }
    if let Ok(val) = std::env::var("REDCAP_API_MAX_REDIRECTS") {
        if let Ok(max) = val.parse() {
            config.api.max_redirects = max;
        }
    }
    if let Ok(val) = std::env::var("REDCAP_API_TLS_VERIFY") {
        config.api.tls_verify = val.parse().unwrap_or(true);
    }

    // Export overrides
    if let Ok(val) = std::env::var("REDCAP_EXPORT_CONTENT") {
        config.export.content = val;
    }
    if let Ok(val) = std::env::var("REDCAP_EXPORT_FORMAT") {
        config.export.format = val;
    }
    if let Ok(val) = std::env::var("REDCAP_EXPORT_TYPE") {
        config.export.record_type = Some(val);
    }
    if let Ok(val) = std::env::var("REDCAP_EXPORT_FILTER_LOGIC") {
        config.export.filter_logic = Some(val);
    }

    // Retry overrides
    if let Ok(val) = std::env::var("REDCAP_RETRY_MAX_RETRIES") {
        if let Ok(retries) = val.parse() {
            config.retry.max_retries = retries;
        }
    }

    // Logging overrides
    if let Ok(val) = std::env::var("REDCAP_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("REDCAP_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}
