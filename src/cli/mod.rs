//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for redcap-export using
//! clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// redcap-export - bulk export client for REDCap APIs
#[derive(Parser, Debug)]
#[command(name = "redcap-export")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "redcap-export.toml", env = "REDCAP_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "REDCAP_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an export against the configured API
    Export(commands::export::ExportArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
