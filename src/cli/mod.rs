//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Casewise using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Casewise - Clinical Case Summary Pipeline
#[derive(Parser, Debug)]
#[command(name = "casewise")]
#[command(version, about, long_about = None)]
#[command(author = "Casewise Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "casewise.toml", env = "CASEWISE_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "CASEWISE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the case pipeline on a FHIR bundle
    Run(commands::run::RunArgs),

    /// Show the cached artifacts of a run directory
    Show(commands::show::ShowArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
