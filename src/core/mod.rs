//! Core business logic for Casewise.
//!
//! # Modules
//!
//! - [`normalize`] - FHIR bundle to [`PatientRecord`](crate::domain::PatientRecord)
//! - [`pipeline`] - The six-stage case workflow and its handlers
//! - [`store`] - Per-run artifact cache
//!
//! # Case Workflow
//!
//! 1. **Parse**: Normalize the bundle into a patient record
//! 2. **Bundle**: Group conditions with their encounters and medications
//! 3. **Match**: For each bundle, retrieve guideline text and extract a recommendation
//! 4. **Gather**: Collect every recommendation once all branches have reported
//! 5. **Summarize**: Produce the clinician-facing case summary
//!
//! # Example
//!
//! ```rust,no_run
//! use casewise::adapters::llm::OpenAiExtractor;
//! use casewise::adapters::retrieval::KeywordIndex;
//! use casewise::config::load_config;
//! use casewise::core::pipeline::{CasePipeline, PipelineSettings};
//! use casewise::engine::LogSink;
//! use std::sync::Arc;
//!
//! # async fn example() -> casewise::domain::Result<()> {
//! let config = load_config("casewise.toml")?;
//! let extractor = OpenAiExtractor::new(&config.llm)?;
//! let index = KeywordIndex::from_dir(
//!     &config.retrieval.guidelines_dir,
//!     config.retrieval.chunk_size,
//!     config.retrieval.similarity_top_k,
//! )?;
//!
//! let pipeline = CasePipeline::new(
//!     Arc::new(extractor),
//!     Arc::new(index),
//!     PipelineSettings::from_config(&config.workflow),
//! );
//! let summary = pipeline.run("patient_bundle.json", LogSink::disabled()).await?;
//! println!("{}", summary.render());
//! # Ok(())
//! # }
//! ```

pub mod normalize;
pub mod pipeline;
pub mod store;
