//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::CasewiseConfig;
use crate::domain::errors::CasewiseError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into CasewiseConfig
/// 4. Applies environment variable overrides (CASEWISE_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use casewise::config::loader::load_config;
///
/// let config = load_config("casewise.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<CasewiseConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(CasewiseError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        CasewiseError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: CasewiseConfig = toml::from_str(&contents)
        .map_err(|e| CasewiseError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        CasewiseError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched. All missing variables are reported together.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| CasewiseError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        lines.push(processed_line);
    }

    if !missing_vars.is_empty() {
        return Err(CasewiseError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

/// Applies environment variable overrides using CASEWISE_* prefix
///
/// Environment variables follow the pattern: CASEWISE_<SECTION>_<KEY>
/// For example: CASEWISE_LLM_MODEL, CASEWISE_WORKFLOW_OUTPUT_DIR
fn apply_env_overrides(config: &mut CasewiseConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("CASEWISE_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // LLM overrides
    if let Ok(val) = std::env::var("CASEWISE_LLM_BASE_URL") {
        config.llm.base_url = val;
    }
    if let Ok(val) = std::env::var("CASEWISE_LLM_MODEL") {
        config.llm.model = val;
    }
    if let Ok(val) = std::env::var("CASEWISE_LLM_TIMEOUT_SECONDS") {
        if let Ok(timeout) = val.parse() {
            config.llm.timeout_seconds = timeout;
        }
    }
    if let Ok(val) = std::env::var("CASEWISE_LLM_RETRY_MAX_RETRIES") {
        if let Ok(retries) = val.parse() {
            config.llm.retry.max_retries = retries;
        }
    }

    // Retrieval overrides
    if let Ok(val) = std::env::var("CASEWISE_RETRIEVAL_GUIDELINES_DIR") {
        config.retrieval.guidelines_dir = val.into();
    }
    if let Ok(val) = std::env::var("CASEWISE_RETRIEVAL_SIMILARITY_TOP_K") {
        if let Ok(top_k) = val.parse() {
            config.retrieval.similarity_top_k = top_k;
        }
    }

    // Workflow overrides
    if let Ok(val) = std::env::var("CASEWISE_WORKFLOW_OUTPUT_DIR") {
        config.workflow.output_dir = val.into();
    }
    if let Ok(val) = std::env::var("CASEWISE_WORKFLOW_TIMEOUT_SECONDS") {
        if let Ok(timeout) = val.parse() {
            config.workflow.timeout_seconds = timeout;
        }
    }
    if let Ok(val) = std::env::var("CASEWISE_WORKFLOW_MAX_PARALLEL_MATCHES") {
        if let Ok(parallel) = val.parse() {
            config.workflow.max_parallel_matches = parallel;
        }
    }
    if let Ok(val) = std::env::var("CASEWISE_WORKFLOW_FILTER_ACTIVE") {
        config.workflow.filter_active = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("CASEWISE_WORKFLOW_VERBOSE") {
        config.workflow.verbose = val.parse().unwrap_or(true);
    }

    // Logging overrides
    if let Ok(val) = std::env::var("CASEWISE_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("CASEWISE_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}
