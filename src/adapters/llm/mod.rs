//! Structured-extraction collaborator
//!
//! - [`StructuredExtractor`] - the seam every pipeline stage calls through
//! - [`OutputSchema`] - records the service can produce, with their JSON schemas
//! - [`OpenAiExtractor`] - OpenAI-compatible chat-completions implementation

pub mod openai;
pub mod schema;
pub mod traits;

pub use openai::OpenAiExtractor;
pub use schema::{OutputSchema, MAX_GUIDELINE_QUERIES, MIN_GUIDELINE_QUERIES};
pub use traits::{extract, ChatMessage, ExtractionRequest, Role, StructuredExtractor};
