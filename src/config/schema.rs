//! Configuration schema types
//!
//! This module defines the configuration structure for Casewise.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main Casewise configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CasewiseConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Structured-extraction service (chat-completions endpoint)
    pub llm: LlmConfig,

    /// Guideline retrieval settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Workflow run settings
    #[serde(default)]
    pub workflow: WorkflowConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CasewiseConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.llm.validate()?;
        self.retrieval.validate()?;
        self.workflow.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Retry configuration for extraction calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per extraction call
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Delay before the given retry attempt (1-based)
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let delay_ms = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        Duration::from_millis((delay_ms as u64).min(self.max_delay_ms))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Structured-extraction service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API (e.g. "https://api.groq.com/openai/v1")
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// API key
    /// Stored securely in memory and automatically zeroized on drop
    pub api_key: SecretString,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,

    /// Per-request timeout in seconds
    #[serde(default = "default_llm_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl LlmConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if self.base_url.is_empty() {
            return Err("llm.base_url cannot be empty".to_string());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("llm.base_url must start with http:// or https://".to_string());
        }

        if url::Url::parse(&self.base_url).is_err() {
            return Err(format!("llm.base_url is not a valid URL: {}", self.base_url));
        }

        if self.model.trim().is_empty() {
            return Err("llm.model cannot be empty".to_string());
        }

        if self.api_key.expose_secret().is_empty() {
            return Err("llm.api_key cannot be empty".to_string());
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "llm.temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            ));
        }

        if self.timeout_seconds == 0 {
            return Err("llm.timeout_seconds must be > 0".to_string());
        }

        if self.retry.max_retries > 10 {
            return Err(format!(
                "llm.retry.max_retries must be <= 10, got {}",
                self.retry.max_retries
            ));
        }

        Ok(())
    }
}

/// Guideline retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Directory of guideline text files (*.txt, *.md)
    #[serde(default = "default_guidelines_dir")]
    pub guidelines_dir: PathBuf,

    /// Number of snippets returned per query
    #[serde(default = "default_similarity_top_k")]
    pub similarity_top_k: usize,

    /// Characters per indexed chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl RetrievalConfig {
    fn validate(&self) -> Result<(), String> {
        if self.similarity_top_k == 0 || self.similarity_top_k > 50 {
            return Err(format!(
                "retrieval.similarity_top_k must be between 1 and 50, got {}",
                self.similarity_top_k
            ));
        }

        if self.chunk_size < 200 {
            return Err(format!(
                "retrieval.chunk_size must be >= 200, got {}",
                self.chunk_size
            ));
        }

        Ok(())
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            guidelines_dir: default_guidelines_dir(),
            similarity_top_k: default_similarity_top_k(),
            chunk_size: default_chunk_size(),
        }
    }
}

/// Workflow run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Root output directory; artifacts go to `<output_dir>/workflow_output`
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Run timeout in seconds (0 = wait indefinitely)
    #[serde(default)]
    pub timeout_seconds: u64,

    /// Maximum simultaneous guideline-matcher invocations
    #[serde(default = "default_max_parallel_matches")]
    pub max_parallel_matches: usize,

    /// Keep only conditions whose clinical status is "active"
    #[serde(default = "default_true")]
    pub filter_active: bool,

    /// Print the run's progress stream
    #[serde(default = "default_true")]
    pub verbose: bool,
}

impl WorkflowConfig {
    fn validate(&self) -> Result<(), String> {
        if self.output_dir.as_os_str().is_empty() {
            return Err("workflow.output_dir cannot be empty".to_string());
        }

        if self.max_parallel_matches == 0 || self.max_parallel_matches > 64 {
            return Err(format!(
                "workflow.max_parallel_matches must be between 1 and 64, got {}",
                self.max_parallel_matches
            ));
        }

        Ok(())
    }

    /// Directory holding one run's artifacts
    pub fn run_dir(&self) -> PathBuf {
        self.output_dir.join("workflow_output")
    }

    /// Run timeout, `None` when unbounded
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            timeout_seconds: 0,
            max_parallel_matches: default_max_parallel_matches(),
            filter_active: true,
            verbose: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_llm_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_llm_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_llm_timeout_seconds() -> u64 {
    120
}

fn default_guidelines_dir() -> PathBuf {
    PathBuf::from("ref_guidelines")
}

fn default_similarity_top_k() -> usize {
    3
}

fn default_chunk_size() -> usize {
    1200
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data_out")
}

fn default_max_parallel_matches() -> usize {
    4
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
