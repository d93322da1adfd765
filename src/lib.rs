// Casewise - Clinical Case Summary Pipeline
// Copyright (c) 2025 Casewise Contributors
// Licensed under the MIT License

//! # Casewise - Clinical Case Summary Pipeline
//!
//! Casewise turns a patient's FHIR bundle into a clinician-facing case summary
//! enriched with guideline recommendations.
//!
//! ## Overview
//!
//! A run goes through six stages:
//! - **Normalizing** the bundle into a [`domain::PatientRecord`]
//! - **Bundling** each active condition with its relevant encounters and medications
//! - **Matching** every bundle against guideline text, one branch per condition
//! - **Gathering** the recommendations once every branch has reported
//! - **Summarizing** everything into a [`domain::CaseSummary`]
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`engine`] - Event-driven orchestration engine with scatter/gather support
//! - [`core`] - Normalizer, artifact store and the case pipeline handlers
//! - [`adapters`] - External integrations (FHIR models, extraction service, guideline retrieval)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use casewise::adapters::llm::OpenAiExtractor;
//! use casewise::adapters::retrieval::KeywordIndex;
//! use casewise::config::load_config;
//! use casewise::core::pipeline::{CasePipeline, PipelineSettings};
//! use casewise::engine::LogSink;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("casewise.toml")?;
//!     let index = KeywordIndex::from_dir(
//!         &config.retrieval.guidelines_dir,
//!         config.retrieval.chunk_size,
//!         config.retrieval.similarity_top_k,
//!     )?;
//!
//!     let pipeline = CasePipeline::new(
//!         Arc::new(OpenAiExtractor::new(&config.llm)?),
//!         Arc::new(index),
//!         PipelineSettings::from_config(&config.workflow),
//!     );
//!
//!     let (log, mut progress) = LogSink::channel();
//!     tokio::spawn(async move {
//!         while let Some(event) = progress.recv().await {
//!             println!("{event}");
//!         }
//!     });
//!
//!     let summary = pipeline.run("patient_bundle.json", log).await?;
//!     println!("{}", summary.render());
//!     Ok(())
//! }
//! ```
//!
//! ## Caching
//!
//! Every stage writes its artifact to the run directory and reuses it on the
//! next run. Nothing checks for staleness; clear the directory (or pass
//! `--fresh` on the command line) to recompute.
//!
//! ## Error Handling
//!
//! All fallible operations return [`domain::Result`]. Handler failures are
//! wrapped with the name of the stage that raised them:
//!
//! ```rust,no_run
//! use casewise::domain::CasewiseError;
//!
//! fn describe(err: &CasewiseError) -> &'static str {
//!     match err.root() {
//!         CasewiseError::Input(_) => "bad bundle",
//!         CasewiseError::Extraction { .. } => "extraction service failed",
//!         _ => "fatal",
//!     }
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod engine;
pub mod logging;
