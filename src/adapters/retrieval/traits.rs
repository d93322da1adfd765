//! Retrieval collaborator interface

use crate::domain::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A retrieved guideline snippet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidelineDocument {
    /// Stable identifier, used for de-duplication across queries
    pub id: String,
    pub text: String,
}

impl GuidelineDocument {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Guideline retrieval service
#[async_trait]
pub trait GuidelineRetriever: Send + Sync {
    /// Returns snippets for `query`, best match first; an empty list is a valid answer
    async fn retrieve(&self, query: &str) -> Result<Vec<GuidelineDocument>>;
}
