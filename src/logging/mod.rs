//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Configurable log levels
//! - Local JSON file logging with rotation
//!
//! Run progress is reported separately through the engine's log stream
//! ([`crate::engine::LogEvent`]); every stream entry is mirrored to `tracing`
//! at debug level.
//!
//! # Example
//!
//! ```no_run
//! use casewise::logging::init_logging;
//! use casewise::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of a pipeline stage
///
/// # Example
///
/// ```no_run
/// use casewise::log_stage_start;
///
/// log_stage_start!("create_condition_bundles");
/// ```
#[macro_export]
macro_rules! log_stage_start {
    ($stage:expr) => {
        tracing::info!(stage = $stage, "Stage started");
    };
}

/// Log the completion of a pipeline stage with its elapsed time
///
/// # Example
///
/// ```no_run
/// use casewise::log_stage_complete;
/// use std::time::Instant;
///
/// let started = Instant::now();
/// log_stage_complete!("generate_output", started.elapsed());
/// ```
#[macro_export]
macro_rules! log_stage_complete {
    ($stage:expr, $duration:expr) => {
        tracing::info!(
            stage = $stage,
            duration_ms = $duration.as_millis() as u64,
            "Stage completed"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use casewise::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, "Connection timeout");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying operation"
        );
    };
}
