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
    #[arg(short, long, default_value = "casewise.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Casewise configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        match fs::write(&self.output, Self::generate_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Set CASEWISE_LLM_API_KEY in your environment or a .env file");
                println!("  3. Put guideline text files (*.txt, *.md) in the guidelines directory");
                println!("  4. Validate configuration: casewise validate-config");
                println!("  5. Run the pipeline: casewise run <BUNDLE_JSON>");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    /// Sample configuration with comments
    fn generate_config() -> String {
        r#"# Casewise Configuration File
# Clinical case summaries from FHIR bundles and guideline text

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Structured-Extraction Service (OpenAI-compatible chat completions)
# ============================================================================
[llm]
base_url = "https://api.groq.com/openai/v1"
model = "llama-3.3-70b-versatile"

# API key (use environment variable)
api_key = "${CASEWISE_LLM_API_KEY}"

# Sampling temperature (0.0 - 2.0)
temperature = 0.0

# Per-request timeout in seconds
timeout_seconds = 120

# Retries for transient failures (timeouts, 429, 5xx)
[llm.retry]
max_retries = 3
initial_delay_ms = 1000
max_delay_ms = 30000
backoff_multiplier = 2.0

# ============================================================================
# Guideline Retrieval
# ============================================================================
[retrieval]
# Directory of guideline text files (*.txt, *.md)
guidelines_dir = "ref_guidelines"

# Snippets returned per search query (1-50)
similarity_top_k = 3

# Characters per indexed chunk (>= 200)
chunk_size = 1200

# ============================================================================
# Workflow
# ============================================================================
[workflow]
# Artifacts are written to <output_dir>/workflow_output and reused on the next run
output_dir = "data_out"

# Run timeout in seconds (0 = wait indefinitely)
timeout_seconds = 0

# Guideline matches in flight at once (1-64)
max_parallel_matches = 4

# Keep only conditions with clinical status "active"
filter_active = true

# Print the progress stream during a run
verbose = true

# ============================================================================
# Logging
# ============================================================================
[logging]
# JSON log file alongside console output
local_enabled = false
local_path = "logs"

# Log rotation (daily or hourly)
local_rotation = "daily"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CasewiseConfig;
    use tempfile::TempDir;

    #[test]
    fn test_generated_config_is_valid() {
        let contents =
            InitArgs::generate_config().replace("${CASEWISE_LLM_API_KEY}", "gsk-test-key");
        let config: CasewiseConfig = toml::from_str(&contents).unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.retrieval.similarity_top_k, 3);
        assert!(config.workflow.filter_active);
    }

    #[tokio::test]
    async fn test_refuses_to_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("casewise.toml");
        fs::write(&path, "existing").unwrap();

        let args = InitArgs {
            output: path.to_string_lossy().to_string(),
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), "existing");

        let forced = InitArgs {
            output: path.to_string_lossy().to_string(),
            force: true,
        };
        assert_eq!(forced.execute().await.unwrap(), 0);
        assert!(fs::read_to_string(&path).unwrap().contains("[workflow]"));
    }
}
