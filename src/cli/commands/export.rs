//! Export command implementation
//!
//! This module implements the `export` command: load and override
//! configuration, build the parameter set, run the export through
//! [`ExportClient`] with a caller-side retry loop, and write the response
//! body to the requested destination.

use std::io::Write;
use std::time::Duration;

use clap::Args;
use tokio::sync::watch;

use crate::client::ExportClient;
use crate::config::{load_config, secret_string, RedcapExportConfig};
use crate::domain::params::{ParameterSet, WireValue};
use crate::domain::ExportError;

/// Arguments for the export command
///
/// Every flag overrides the corresponding `[export]` configuration value;
/// comma-separated flags split into ordered sequences.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// API token (prefer the environment variable over the flag)
    #[arg(long, env = "REDCAP_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Override export content (record, metadata, project, ...)
    #[arg(long)]
    pub content: Option<String>,

    /// Override response format (csv, json, xml)
    #[arg(long)]
    pub format: Option<String>,

    /// Override record type (flat or eav)
    #[arg(long = "type")]
    pub record_type: Option<String>,

    /// Record identifiers to export (comma-separated)
    #[arg(long)]
    pub records: Option<String>,

    /// Field names to export (comma-separated)
    #[arg(long)]
    pub fields: Option<String>,

    /// Instruments to export (comma-separated)
    #[arg(long)]
    pub forms: Option<String>,

    /// Unique event names to export (comma-separated)
    #[arg(long)]
    pub events: Option<String>,

    /// Override raw-vs-label rendering for data values
    #[arg(long)]
    pub raw_or_label: Option<String>,

    /// Override raw-vs-label rendering for CSV headers
    #[arg(long)]
    pub raw_or_label_headers: Option<String>,

    /// Override the filter expression
    #[arg(long)]
    pub filter_logic: Option<String>,

    /// Write the response body to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,

    /// Print the request parameters without calling the API
    #[arg(long)]
    pub dry_run: bool,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Error: {e}");
                return Ok(2);
            }
        };

        self.apply_overrides(&mut config);

        // Build the parameter set; enumeration and cross-field errors are
        // caught here, before any network I/O
        let params = match config
            .export
            .to_parameter_set(config.api.token.clone())
        {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "Parameter validation failed");
                eprintln!("Error: {e}");
                return Ok(2);
            }
        };

        if self.dry_run || config.application.dry_run {
            println!("DRY RUN - no request will be sent");
            println!("Endpoint: {}", config.api.url);
            print_wire_form(&params);
            return Ok(0);
        }

        let client = match ExportClient::from_config(&config.api) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to build export client");
                eprintln!("Error: {e}");
                return Ok(2);
            }
        };

        match self
            .run_with_retries(&client, &params, &config, shutdown_signal)
            .await
        {
            Ok(body) => {
                self.write_output(&body, config.export.output_path.as_deref())?;
                Ok(0)
            }
            Err(ExportError::Cancelled) => {
                eprintln!("Export cancelled");
                Ok(3)
            }
            Err(e) => {
                tracing::error!(error = %e, "Export failed");
                eprintln!("Error: {e}");
                Ok(3)
            }
        }
    }

    /// Apply CLI flag overrides onto the loaded configuration
    fn apply_overrides(&self, config: &mut RedcapExportConfig) {
        if let Some(ref token) = self.token {
            config.api.token = secret_string(token.clone());
        }
        if let Some(ref content) = self.content {
            tracing::info!(content = %content, "Overriding export content from CLI");
            config.export.content = content.clone();
        }
        if let Some(ref format) = self.format {
            tracing::info!(format = %format, "Overriding export format from CLI");
            config.export.format = format.clone();
        }
        if let Some(ref record_type) = self.record_type {
            config.export.record_type = Some(record_type.clone());
        }
        if let Some(ref raw_or_label) = self.raw_or_label {
            config.export.raw_or_label = raw_or_label.clone();
        }
        if let Some(ref headers) = self.raw_or_label_headers {
            config.export.raw_or_label_headers = headers.clone();
        }
        if let Some(ref filter) = self.filter_logic {
            config.export.filter_logic = Some(filter.clone());
        }
        if let Some(ref records) = self.records {
            config.export.records = split_list(records);
        }
        if let Some(ref fields) = self.fields {
            config.export.fields = split_list(fields);
        }
        if let Some(ref forms) = self.forms {
            config.export.forms = split_list(forms);
        }
        if let Some(ref events) = self.events {
            config.export.events = split_list(events);
        }
        if let Some(ref output) = self.output {
            config.export.output_path = Some(output.clone());
        }
    }

    /// One export with caller-side retries and exponential backoff
    ///
    /// Only retryable failures (server failures, transient transport
    /// failures) are retried; rejections and cancellation return
    /// immediately. Each attempt is one independent `execute` call against
    /// the same immutable parameter set.
    async fn run_with_retries(
        &self,
        client: &ExportClient,
        params: &ParameterSet,
        config: &RedcapExportConfig,
        shutdown_signal: watch::Receiver<bool>,
    ) -> Result<Vec<u8>, ExportError> {
        let retry = &config.retry;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match client
                .execute_with_shutdown(params, shutdown_signal.clone())
                .await
            {
                Ok(result) => return Ok(result.body),
                Err(e) if e.is_retryable() && attempt < retry.max_retries => {
                    let delay_ms = retry.initial_delay_ms
                        * (retry.backoff_multiplier.powf((attempt - 1) as f64) as u64).max(1);
                    let delay_ms = delay_ms.min(retry.max_delay_ms);

                    tracing::warn!(
                        attempt = attempt,
                        max_retries = retry.max_retries,
                        delay_ms = delay_ms,
                        error = %e,
                        "Retrying export after error"
                    );

                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Write the response body to the configured destination
    fn write_output(&self, body: &[u8], output_path: Option<&str>) -> anyhow::Result<()> {
        match output_path {
            Some(path) => {
                std::fs::write(path, body)?;
                tracing::info!(path = %path, bytes = body.len(), "Wrote export output");
                eprintln!("Wrote {} bytes to {path}", body.len());
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(body)?;
                stdout.flush()?;
            }
        }
        Ok(())
    }
}

/// Split a comma-separated CLI value into trimmed identifiers
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Print the wire form with the token redacted
fn print_wire_form(params: &ParameterSet) {
    for (key, value) in params.to_wire_form() {
        match value {
            WireValue::Scalar(v) => {
                if key == "token" {
                    println!("  token=[REDACTED]");
                } else {
                    println!("  {key}={v}");
                }
            }
            WireValue::List(items) => {
                for item in items {
                    println!("  {key}[]={item}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list("a, b ,c"),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert_eq!(split_list(""), Vec::<String>::new());
        assert_eq!(split_list("solo"), vec!["solo".to_string()]);
    }

    #[test]
    fn test_apply_overrides() {
        let mut config: RedcapExportConfig = toml::from_str(
            r#"
[api]
url = "https://redcap.example.edu/api/"
token = "FROM_CONFIG"

[export]
content = "record"
format = "csv"
type = "flat"
"#,
        )
        .unwrap();

        let args = ExportArgs {
            token: Some("FROM_CLI".to_string()),
            content: Some("metadata".to_string()),
            format: Some("json".to_string()),
            record_type: None,
            records: None,
            fields: Some("record_id,age".to_string()),
            forms: None,
            events: None,
            raw_or_label: None,
            raw_or_label_headers: None,
            filter_logic: None,
            output: Some("out.json".to_string()),
            dry_run: false,
        };

        args.apply_overrides(&mut config);
        assert_eq!(config.export.content, "metadata");
        assert_eq!(config.export.format, "json");
        assert_eq!(config.export.fields, vec!["record_id", "age"]);
        assert_eq!(config.export.output_path.as_deref(), Some("out.json"));
        assert_eq!(config.api.token.expose_secret().as_ref(), "FROM_CLI");
    }
}
