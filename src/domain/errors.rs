//! Domain error types
//!
//! This module defines the error hierarchy for Casewise.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main Casewise error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum CasewiseError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid or incomplete clinical input (missing Patient resource, malformed bundle)
    #[error("Input error: {0}")]
    Input(String),

    /// A structured-extraction call failed inside a pipeline stage
    #[error("Extraction failed in stage '{stage}': {source}")]
    Extraction {
        /// Stage that issued the call
        stage: String,
        /// Underlying extraction failure
        #[source]
        source: ExtractionError,
    },

    /// Guideline retrieval errors
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Orchestration engine errors
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl CasewiseError {
    /// Wraps an extraction failure with the name of the stage that issued it
    pub fn extraction(stage: impl Into<String>, source: ExtractionError) -> Self {
        CasewiseError::Extraction {
            stage: stage.into(),
            source,
        }
    }

    /// Returns true for errors caused by the caller's input rather than the pipeline
    pub fn is_input_error(&self) -> bool {
        matches!(self, CasewiseError::Input(_))
    }

    /// Walks through handler wrapping and returns the innermost Casewise error
    pub fn root(&self) -> &CasewiseError {
        match self {
            CasewiseError::Workflow(WorkflowError::Handler { source, .. }) => source.root(),
            other => other,
        }
    }
}

/// Structured-extraction errors
///
/// Errors raised by the language-model extraction collaborator.
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Failed to reach the extraction service
    #[error("Request failed: {0}")]
    Request(String),

    /// The service answered with an error status
    #[error("Service error: {status} - {message}")]
    Service { status: u16, message: String },

    /// The service answered but produced no structured output
    #[error("No structured output in response: {0}")]
    MissingOutput(String),

    /// The structured output does not match the requested schema
    #[error("Output does not match schema '{schema}': {message}")]
    SchemaMismatch { schema: String, message: String },

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),
}

impl ExtractionError {
    /// Whether a retry of the same call may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ExtractionError::Request(_) | ExtractionError::Timeout(_) => true,
            ExtractionError::Service { status, .. } => *status == 429 || *status >= 500,
            ExtractionError::MissingOutput(_) | ExtractionError::SchemaMismatch { .. } => false,
        }
    }
}

/// Orchestration engine errors
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// No handler subscribes to the start event
    #[error("No handler is registered for the start event")]
    MissingStartHandler,

    /// Two handlers subscribe to the same event kind
    #[error("Event kind '{0}' already has a registered handler")]
    DuplicateHandler(String),

    /// A handler declares an emitted kind that nothing consumes
    #[error("Handler '{handler}' emits '{kind}' but no handler consumes it")]
    UnconsumedEvent { handler: String, kind: String },

    /// No handler declares the terminal event
    #[error("No handler emits the stop event")]
    NoTerminalEmitter,

    /// A handler emitted a kind missing from its declared edge list
    #[error("Handler '{handler}' emitted undeclared event '{kind}'")]
    UndeclaredEmission { handler: String, kind: String },

    /// A handler body failed; the run is aborted
    #[error("Handler '{handler}' failed: {source}")]
    Handler {
        handler: String,
        #[source]
        source: Box<CasewiseError>,
    },

    /// The run exceeded its configured timeout
    #[error("Run timed out after {0}s")]
    Timeout(u64),

    /// No events are pending, nothing is running, and no result was produced
    #[error("Run stalled with {pending_gather} gathered result(s) still waiting for their siblings")]
    Stalled { pending_gather: usize },

    /// A gather arrival happened before the fan-out width was recorded
    #[error("Gather received an arrival before the fan-out width was recorded")]
    FanOutWidthUnset,

    /// A handler read a context value no earlier stage has stored
    #[error("Run context has no value for '{0}'")]
    MissingContextValue(&'static str),

    /// More arrivals than the recorded fan-out width
    #[error("Gather received {arrived} arrivals for a fan-out width of {expected}")]
    FanOutOverflow { expected: usize, arrived: usize },
}

// Conversion from std::io::Error
impl From<std::io::Error> for CasewiseError {
    fn from(err: std::io::Error) -> Self {
        CasewiseError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for CasewiseError {
    fn from(err: serde_json::Error) -> Self {
        CasewiseError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for CasewiseError {
    fn from(err: toml::de::Error) -> Self {
        CasewiseError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_casewise_error_display() {
        let err = CasewiseError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_extraction_error_names_stage() {
        let err = CasewiseError::extraction(
            "create_condition_bundles",
            ExtractionError::MissingOutput("empty choices".to_string()),
        );
        let message = err.to_string();
        assert!(message.contains("create_condition_bundles"));
        assert!(message.contains("empty choices"));
    }

    #[test]
    fn test_workflow_error_conversion() {
        let err: CasewiseError = WorkflowError::Timeout(30).into();
        assert!(matches!(err, CasewiseError::Workflow(WorkflowError::Timeout(30))));
    }

    #[test]
    fn test_root_unwraps_handler_failures() {
        let inner = CasewiseError::Input("No Patient resource".to_string());
        let wrapped: CasewiseError = WorkflowError::Handler {
            handler: "parse_patient_info".to_string(),
            source: Box::new(inner),
        }
        .into();

        assert!(wrapped.root().is_input_error());
        assert!(wrapped.to_string().contains("parse_patient_info"));
    }

    #[test]
    fn test_retryable_extraction_errors() {
        assert!(ExtractionError::Timeout("60s".to_string()).is_retryable());
        assert!(ExtractionError::Service {
            status: 503,
            message: "overloaded".to_string()
        }
        .is_retryable());
        assert!(ExtractionError::Service {
            status: 429,
            message: "rate limited".to_string()
        }
        .is_retryable());
        assert!(!ExtractionError::Service {
            status: 400,
            message: "bad request".to_string()
        }
        .is_retryable());
        assert!(!ExtractionError::SchemaMismatch {
            schema: "CaseSummary".to_string(),
            message: "missing field".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: CasewiseError = io_err.into();
        assert!(matches!(err, CasewiseError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: CasewiseError = json_err.into();
        assert!(matches!(err, CasewiseError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: CasewiseError = toml_err.into();
        assert!(matches!(err, CasewiseError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_casewise_error_implements_std_error() {
        let err = CasewiseError::Input("Test error".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
