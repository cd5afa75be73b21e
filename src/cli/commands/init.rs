//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "redcap-export.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        if Path::new(&self.output).exists() && !self.force {
            println!("Configuration file already exists: {}", self.output);
            println!("  Use --force to overwrite");
            return Ok(2);
        }

        match fs::write(&self.output, Self::sample_config()) {
            Ok(_) => {
                println!("Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your API endpoint", self.output);
                println!("  2. Export your API token: export REDCAP_API_TOKEN=...");
                println!("  3. Validate: redcap-export validate-config");
                println!("  4. Run: redcap-export export");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("Failed to write configuration file");
                println!("  Error: {e}");
                Ok(5)
            }
        }
    }

    /// Sample configuration written by `init`
    fn sample_config() -> &'static str {
        r#"# redcap-export Configuration File
# Bulk export client for token-authenticated REDCap APIs

[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# Print the request parameters instead of calling the API
dry_run = false

[api]
# Full URL of the API endpoint
url = "https://redcap.example.edu/api/"

# API token; keep it out of this file and in the environment
token = "${REDCAP_API_TOKEN}"

# Request timeout in seconds
timeout_seconds = 30

# Maximum automatic redirects to follow
max_redirects = 10

# TLS certificate verification. Disabling this accepts ANY certificate;
# only opt out for internal servers with self-signed certificates.
tls_verify = true

[export]
# Export target (record, project, metadata, instrument, event, arm,
# user, report, version, formEventMapping)
content = "record"

# Response format (csv, json, xml)
format = "csv"

# Record shape, required when content = "record" (flat or eav)
type = "flat"

# Raw values or labels (raw or label)
raw_or_label = "raw"
raw_or_label_headers = "raw"

# Boolean export options
export_checkbox_label = false
export_survey_fields = false
export_data_access_groups = false

# Restrict the export; an empty list means "all"
records = []
fields = []
forms = []
events = []

# Optional filter expression
# filter_logic = "[age] > 30"

# Write the response body here instead of stdout
# output_path = "export.csv"

[retry]
# Attempts for retryable failures (server errors, transient transport
# failures); 1 disables retries
max_retries = 3
initial_delay_ms = 1000
max_delay_ms = 30000
backoff_multiplier = 2.0

[logging]
local_enabled = false
local_path = "logs"
local_rotation = "daily"
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_args_defaults() {
        let args = InitArgs {
            output: "redcap-export.toml".to_string(),
            force: false,
        };

        assert_eq!(args.output, "redcap-export.toml");
        assert!(!args.force);
    }

    #[test]
    fn test_sample_config_has_all_sections() {
        let config = InitArgs::sample_config();
        assert!(config.contains("[application]"));
        assert!(config.contains("[api]"));
        assert!(config.contains("[export]"));
        assert!(config.contains("[retry]"));
        assert!(config.contains("[logging]"));
    }

    #[test]
    fn test_sample_config_parses() {
        // The ${REDCAP_API_TOKEN} placeholder is literal TOML until the
        // loader substitutes it, so parsing the raw sample must succeed
        let config: crate::config::RedcapExportConfig =
            toml::from_str(InitArgs::sample_config()).unwrap();
        assert_eq!(config.export.content, "record");
        assert!(config.api.tls_verify);
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("redcap-export.toml");
        fs::write(&path, "existing").unwrap();

        let args = InitArgs {
            output: path.to_string_lossy().to_string(),
            force: false,
        };
        let code = args.execute().await.unwrap();
        assert_eq!(code, 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), "existing");
    }

    #[tokio::test]
    async fn test_init_writes_valid_sample() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("redcap-export.toml");

        let args = InitArgs {
            output: path.to_string_lossy().to_string(),
            force: false,
        };
        let code = args.execute().await.unwrap();
        assert_eq!(code, 0);
        assert!(path.exists());
    }
}
