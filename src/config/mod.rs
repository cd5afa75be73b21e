//! Configuration management for redcap-export.
//!
//! This module provides TOML-based configuration loading, parsing, and
//! validation.
//!
//! # Overview
//!
//! redcap-export uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `REDCAP_*` environment variable overrides
//! - Default values for optional settings
//! - Validation on load (enumerated export values included)
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [api]
//! url = "https://redcap.example.edu/api/"
//! token = "${REDCAP_API_TOKEN}"
//! tls_verify = true
//!
//! [export]
//! content = "record"
//! format = "csv"
//! type = "flat"
//! forms = ["demographics"]
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use redcap_export::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("redcap-export.toml")?;
//! println!("API endpoint: {}", config.api.url);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApiConfig, ApplicationConfig, ExportSettings, LoggingConfig, RedcapExportConfig, RetryConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
