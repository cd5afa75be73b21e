// redcap-export - Bulk export client for REDCap APIs
// Licensed under the MIT License

//! # redcap-export - Bulk export client for REDCap APIs
//!
//! redcap-export is a client and CLI for bulk-exporting records from
//! token-authenticated REDCap REST APIs. It replaces a pile of near-duplicate
//! one-off export scripts with one parameterized pair: a validated
//! [`ParameterSet`](domain::ParameterSet) describing the export, and an
//! [`ExportClient`](client::ExportClient) that submits it and classifies the
//! outcome.
//!
//! ## Architecture
//!
//! The crate follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`client`] - Export client and the injected HTTP transport
//! - [`domain`] - Parameter set, enumerations, and error taxonomy
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use redcap_export::client::ExportClient;
//! use redcap_export::config::load_config;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("redcap-export.toml")?;
//!
//!     let params = config
//!         .export
//!         .to_parameter_set(config.api.token.clone())?;
//!
//!     let client = ExportClient::from_config(&config.api)?;
//!     let result = client.execute(&params).await?;
//!
//!     println!("{}", result.body_text());
//!     Ok(())
//! }
//! ```
//!
//! ## Request lifecycle
//!
//! A parameter set is validated at construction, never at transport time:
//! required fields, enumerated values, and cross-field rules (`type` is
//! required iff `content = record`) are all checked by the builder. The
//! client then serializes it into an `application/x-www-form-urlencoded`
//! body, issues exactly one POST per `execute` call, and classifies the
//! result: 2xx yields the raw body, 4xx a rejection carrying the server's
//! message, 5xx a retryable server failure, and transport problems their
//! own taxonomy. Retry policy belongs to the caller.
//!
//! ## Error Handling
//!
//! All fallible operations report through the
//! [`domain::RedcapError`] hierarchy:
//!
//! ```rust,no_run
//! use redcap_export::domain::RedcapError;
//!
//! fn example() -> Result<(), RedcapError> {
//!     let config = redcap_export::config::load_config("redcap-export.toml")?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod domain;
pub mod logging;
