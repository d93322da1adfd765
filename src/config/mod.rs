//! Configuration management for Casewise.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Casewise uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `CASEWISE_<SECTION>_<KEY>` overrides applied after parsing
//! - Default values for optional settings
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use casewise::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("casewise.toml")?;
//!
//! println!("Model: {}", config.llm.model);
//! println!("Guidelines: {}", config.retrieval.guidelines_dir.display());
//! println!("Artifacts: {}", config.workflow.run_dir().display());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`LlmConfig`] - Extraction endpoint, model, key and retry policy
//! - [`RetrievalConfig`] - Guideline corpus location and top-k
//! - [`WorkflowConfig`] - Output directory, timeout and matcher concurrency
//! - [`LoggingConfig`] - Local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [llm]
//! base_url = "https://api.groq.com/openai/v1"
//! model = "llama-3.3-70b-versatile"
//! api_key = "${GROQ_API_KEY}"
//!
//! [retrieval]
//! guidelines_dir = "ref_guidelines"
//! similarity_top_k = 3
//!
//! [workflow]
//! output_dir = "data_out"
//! max_parallel_matches = 4
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, CasewiseConfig, LlmConfig, LoggingConfig, RetrievalConfig, RetryConfig,
    WorkflowConfig,
};
pub use secret::{redacted_preview, secret_string, SecretString, SecretValue};
