//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Casewise configuration file.

use crate::config::{load_config, redacted_preview, CasewiseConfig};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates after substitution and overrides
        match load_config(config_path) {
            Ok(config) => {
                println!("✅ Configuration is valid");
                println!();
                println!("{}", summarize(&config));
                Ok(0)
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                Ok(2)
            }
        }
    }
}

/// Configuration summary with the API key redacted
fn summarize(config: &CasewiseConfig) -> String {
    let timeout = match config.workflow.timeout_seconds {
        0 => "none".to_string(),
        secs => format!("{secs}s"),
    };

    [
        "Configuration Summary:".to_string(),
        format!("  Log Level: {}", config.application.log_level),
        format!("  LLM Endpoint: {}", config.llm.base_url),
        format!("  LLM Model: {}", config.llm.model),
        format!("  LLM API Key: {}", redacted_preview(&config.llm.api_key)),
        format!("  LLM Max Retries: {}", config.llm.retry.max_retries),
        format!(
            "  Guidelines Directory: {}",
            config.retrieval.guidelines_dir.display()
        ),
        format!("  Similarity Top K: {}", config.retrieval.similarity_top_k),
        format!("  Run Directory: {}", config.workflow.run_dir().display()),
        format!("  Run Timeout: {timeout}"),
        format!(
            "  Max Parallel Matches: {}",
            config.workflow.max_parallel_matches
        ),
        format!("  Active Conditions Only: {}", config.workflow.filter_active),
        format!("  File Logging: {}", config.logging.local_enabled),
    ]
    .join("\n")
}
