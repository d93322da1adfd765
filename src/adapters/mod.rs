//! External system integrations for Casewise.
//!
//! - [`fhir`] - FHIR R4 bundle models consumed by the record normalizer
//! - [`llm`] - Structured-extraction service (OpenAI-compatible chat completions)
//! - [`retrieval`] - Guideline retrieval (local keyword index)
//!
//! # Design Pattern
//!
//! Collaborators sit behind traits ([`llm::StructuredExtractor`],
//! [`retrieval::GuidelineRetriever`]) so the pipeline can be driven by test
//! doubles and alternative backends.
//!
//! ```rust,no_run
//! use casewise::adapters::llm::OpenAiExtractor;
//! use casewise::adapters::retrieval::KeywordIndex;
//! use casewise::config::load_config;
//!
//! # fn example() -> casewise::domain::Result<()> {
//! let config = load_config("casewise.toml")?;
//! let extractor = OpenAiExtractor::new(&config.llm)?;
//! let index = KeywordIndex::from_dir(
//!     &config.retrieval.guidelines_dir,
//!     config.retrieval.chunk_size,
//!     config.retrieval.similarity_top_k,
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod fhir;
pub mod llm;
pub mod retrieval;
