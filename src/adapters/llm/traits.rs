//! Structured-extraction collaborator interface

use super::schema::OutputSchema;
use crate::domain::ExtractionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Chat message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One chat message of an extraction prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A request for one structured value
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Name of the output schema; also the tool name
    pub schema_name: String,

    pub description: String,

    /// JSON schema the output must follow
    pub schema: Value,

    /// Rendered prompt
    pub messages: Vec<ChatMessage>,
}

impl ExtractionRequest {
    /// Builds a request for the schema of `T`
    pub fn for_schema<T: OutputSchema>(messages: Vec<ChatMessage>) -> Self {
        Self {
            schema_name: T::NAME.to_string(),
            description: T::DESCRIPTION.to_string(),
            schema: T::json_schema(),
            messages,
        }
    }
}

/// Language-model extraction service: prompt in, schema-conforming JSON out
///
/// Implementations must be safe to call concurrently; the guideline matcher
/// issues calls from several in-flight handler invocations at once.
#[async_trait]
pub trait StructuredExtractor: Send + Sync {
    /// Returns the raw JSON value produced for `request.schema`
    async fn predict(&self, request: ExtractionRequest) -> Result<Value, ExtractionError>;
}

/// Calls `extractor` and decodes + validates the result as `T`
pub async fn extract<T: OutputSchema>(
    extractor: &dyn StructuredExtractor,
    messages: Vec<ChatMessage>,
) -> Result<T, ExtractionError> {
    let value = extractor
        .predict(ExtractionRequest::for_schema::<T>(messages))
        .await?;

    let parsed: T = serde_json::from_value(value).map_err(|e| ExtractionError::SchemaMismatch {
        schema: T::NAME.to_string(),
        message: e.to_string(),
    })?;

    parsed.validate()
}
