//! Logging and observability
//!
//! Structured logging via `tracing`: console output plus optional
//! JSON-formatted file logging with rotation.
//!
//! # Example
//!
//! ```no_run
//! use redcap_export::logging::init_logging;
//! use redcap_export::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};
