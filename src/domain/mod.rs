//! Domain models and types for Casewise.
//!
//! This module contains the value records that flow between pipeline stages,
//! plus the error hierarchy.
//!
//! # Overview
//!
//! - **Patient data** ([`PatientRecord`], [`Condition`], [`Encounter`], [`Medication`])
//! - **Intermediate results** ([`ConditionBundle`], [`ConditionBundleSet`], [`GuidelineMatch`])
//! - **Terminal artifact** ([`CaseSummary`])
//! - **Error types** ([`CasewiseError`], [`ExtractionError`], [`WorkflowError`])
//! - **Result type alias** ([`Result`])
//!
//! All records are immutable values once produced; each stage owns what it
//! produces until it hands it off through an engine event.
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, CasewiseError>`]:
//!
//! ```rust,no_run
//! use casewise::domain::Result;
//!
//! fn example() -> Result<()> {
//!     let config = casewise::config::load_config("casewise.toml")?;
//!     Ok(())
//! }
//! ```

pub mod bundle;
pub mod errors;
pub mod guideline;
pub mod patient;
pub mod result;
pub mod summary;

// Re-export commonly used types for convenience
pub use bundle::{ConditionBundle, ConditionBundleSet};
pub use errors::{CasewiseError, ExtractionError, WorkflowError};
pub use guideline::{GuidelineMatch, GuidelineQueries, GuidelineRecommendation};
pub use patient::{Condition, Encounter, Medication, PatientRecord};
pub use result::Result;
pub use summary::{CaseSummary, ConditionSummary};
