//! Run command implementation
//!
//! This module implements the `run` command: one pipeline run from a FHIR
//! bundle to a printed case summary.

use super::exit_code_for;
use crate::adapters::llm::OpenAiExtractor;
use crate::adapters::retrieval::KeywordIndex;
use crate::config::load_config;
use crate::core::pipeline::{CasePipeline, PipelineSettings};
use crate::core::store::{Artifact, ArtifactStore};
use crate::engine::{LogEvent, LogSink};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// FHIR bundle (JSON) to summarize
    pub bundle: PathBuf,

    /// Override the output directory (artifacts go to <DIR>/workflow_output)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Delete cached artifacts before running
    #[arg(long)]
    pub fresh: bool,

    /// Override the run timeout in seconds (0 = no timeout)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Do not print the progress stream
    #[arg(short, long)]
    pub quiet: bool,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(
        &self,
        config_path: &str,
        mut shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(bundle = %self.bundle.display(), "Starting run command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        // Apply CLI overrides
        if let Some(dir) = &self.output_dir {
            tracing::info!(output_dir = %dir.display(), "Overriding output directory from CLI");
            config.workflow.output_dir = dir.clone();
        }
        if let Some(timeout) = self.timeout {
            tracing::info!(timeout_seconds = timeout, "Overriding run timeout from CLI");
            config.workflow.timeout_seconds = timeout;
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        let store = ArtifactStore::new(config.workflow.run_dir());
        if self.fresh {
            let removed = store.clear().await?;
            tracing::info!(removed = removed, "Cleared cached artifacts");
        }

        // Input errors are reported before any stage executes
        if !store.exists(Artifact::PatientInfo) && !self.bundle.is_file() {
            eprintln!("Bundle not found: {}", self.bundle.display());
            return Ok(3);
        }

        let extractor = match OpenAiExtractor::new(&config.llm) {
            Ok(e) => e,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create extraction client");
                eprintln!("Failed to initialize extraction client: {e}");
                return Ok(4);
            }
        };
        let index = match KeywordIndex::from_dir(
            &config.retrieval.guidelines_dir,
            config.retrieval.chunk_size,
            config.retrieval.similarity_top_k,
        ) {
            Ok(i) => i,
            Err(e) => {
                tracing::error!(error = %e, "Failed to build guideline index");
                eprintln!("Failed to load guidelines: {e}");
                return Ok(4);
            }
        };

        let pipeline = CasePipeline::new(
            Arc::new(extractor),
            Arc::new(index),
            PipelineSettings::from_config(&config.workflow),
        );

        let (log, receiver) = LogSink::channel();
        let printer = (config.workflow.verbose && !self.quiet)
            .then(|| tokio::spawn(print_progress(receiver)));

        let outcome = tokio::select! {
            result = pipeline.run(&self.bundle, log) => Some(result),
            _ = shutdown_requested(&mut shutdown_signal) => None,
        };

        // The sink is dropped with the run future, which closes the channel
        let streamed = printer.is_some();
        if let Some(printer) = printer {
            let _ = printer.await;
        }

        let exit_code = match outcome {
            None => {
                println!();
                println!("⚠️  Run interrupted. Completed stages are cached in {}", store.dir().display());
                tracing::info!("Run interrupted by user signal");
                130
            }
            Some(Ok(summary)) => {
                // The progress stream already carried the rendered summary
                if !streamed {
                    println!();
                    println!("{}", summary.render());
                }
                println!();
                tracing::info!(run_dir = %store.dir().display(), "Run completed");
                0
            }
            Some(Err(e)) => {
                tracing::error!(error = %e, "Run failed");
                eprintln!("Run failed: {e}");
                exit_code_for(&e)
            }
        };

        Ok(exit_code)
    }
}

/// Resolves once shutdown is requested; never resolves if the signal source goes away
async fn shutdown_requested(signal: &mut watch::Receiver<bool>) {
    loop {
        if *signal.borrow_and_update() {
            return;
        }
        if signal.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

async fn print_progress(mut receiver: mpsc::UnboundedReceiver<LogEvent>) {
    while let Some(event) = receiver.recv().await {
        if event.delta {
            print!("{event}");
        } else {
            println!("{event}");
        }
    }
}
