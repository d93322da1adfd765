//! Guideline retrieval collaborator
//!
//! - [`GuidelineRetriever`] - query string in, ranked guideline snippets out
//! - [`KeywordIndex`] - in-memory tantivy full-text index over a directory of guideline text

pub mod keyword;
pub mod traits;

pub use keyword::KeywordIndex;
pub use traits::{GuidelineDocument, GuidelineRetriever};
