//! Case pipeline
//!
//! Six handlers wired into one [`Workflow`]:
//!
//! ```text
//! Start -> parse_patient_info -> PatientInfo
//!       -> create_condition_bundles -> ConditionBundles
//!       -> dispatch_guideline_match -> MatchGuideline x N  (or GenerateCaseSummary when N = 0)
//!       -> handle_guideline_match -> MatchGuidelineResult
//!       -> gather_guideline_match -> GenerateCaseSummary (once, after all N)
//!       -> generate_output -> Stop
//! ```
//!
//! Every stage that produces an artifact checks the [`ArtifactStore`] first,
//! so an interrupted run resumes where it stopped.

pub mod aggregate;
pub mod bundler;
pub mod matcher;
pub mod patient;
pub mod prompts;
pub mod summary;

use crate::adapters::llm::StructuredExtractor;
use crate::adapters::retrieval::GuidelineRetriever;
use crate::config::WorkflowConfig;
use crate::core::store::ArtifactStore;
use crate::domain::{CaseSummary, CasewiseError, Result};
use crate::engine::{Event, EventKind, LogSink, Workflow, WorkflowBuilder};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub use aggregate::{DispatchGuidelineMatch, GatherGuidelineMatch};
pub use bundler::CreateConditionBundles;
pub use matcher::HandleGuidelineMatch;
pub use patient::ParsePatientInfo;
pub use summary::GenerateOutput;

/// Error for a handler receiving an event kind it does not consume
///
/// The engine routes by kind, so this only fires if a handler is invoked
/// directly with the wrong event.
pub(crate) fn unexpected_event(stage: &str, kind: EventKind) -> CasewiseError {
    CasewiseError::Other(format!("Stage '{stage}' cannot handle event '{kind}'"))
}

/// Run-level knobs the handlers need
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub run_dir: PathBuf,
    pub filter_active: bool,
    pub max_parallel_matches: usize,
    pub timeout: Option<Duration>,
    /// Reference date for the age computed from the birth date
    pub today: NaiveDate,
}

impl PipelineSettings {
    pub fn from_config(config: &WorkflowConfig) -> Self {
        Self {
            run_dir: config.run_dir(),
            filter_active: config.filter_active,
            max_parallel_matches: config.max_parallel_matches,
            timeout: config.timeout(),
            today: chrono::Local::now().date_naive(),
        }
    }
}

/// Builds and runs the case workflow against a pair of collaborators
pub struct CasePipeline {
    extractor: Arc<dyn StructuredExtractor>,
    retriever: Arc<dyn GuidelineRetriever>,
    settings: PipelineSettings,
    store: ArtifactStore,
}

impl CasePipeline {
    pub fn new(
        extractor: Arc<dyn StructuredExtractor>,
        retriever: Arc<dyn GuidelineRetriever>,
        settings: PipelineSettings,
    ) -> Self {
        let store = ArtifactStore::new(&settings.run_dir);
        Self {
            extractor,
            retriever,
            settings,
            store,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Registers the six stages; fails if the graph does not verify
    pub fn build_workflow(&self) -> Result<Workflow> {
        let workflow = WorkflowBuilder::new()
            .handler(ParsePatientInfo {
                store: self.store.clone(),
                filter_active: self.settings.filter_active,
            })
            .handler(CreateConditionBundles {
                extractor: Arc::clone(&self.extractor),
                store: self.store.clone(),
            })
            .handler(DispatchGuidelineMatch {
                store: self.store.clone(),
            })
            .handler(HandleGuidelineMatch {
                extractor: Arc::clone(&self.extractor),
                retriever: Arc::clone(&self.retriever),
                max_workers: self.settings.max_parallel_matches,
            })
            .handler(GatherGuidelineMatch {
                store: self.store.clone(),
            })
            .handler(GenerateOutput {
                extractor: Arc::clone(&self.extractor),
                store: self.store.clone(),
                today: self.settings.today,
            })
            .timeout(self.settings.timeout)
            .build()?;
        Ok(workflow)
    }

    /// Runs the pipeline for one bundle file and returns the case summary
    pub async fn run(&self, bundle_path: impl Into<PathBuf>, log: LogSink) -> Result<CaseSummary> {
        let bundle_path = bundle_path.into();
        self.store.ensure_dir().await?;

        tracing::info!(
            bundle = %bundle_path.display(),
            run_dir = %self.store.dir().display(),
            "Starting case pipeline"
        );

        let workflow = self.build_workflow()?;
        workflow.run(Event::Start { bundle_path }, log).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::llm::ExtractionRequest;
    use crate::adapters::retrieval::GuidelineDocument;
    use crate::domain::ExtractionError;
    use async_trait::async_trait;

    struct NoExtractor;

    #[async_trait]
    impl StructuredExtractor for NoExtractor {
        async fn predict(
            &self,
            request: ExtractionRequest,
        ) -> std::result::Result<serde_json::Value, ExtractionError> {
            Err(ExtractionError::MissingOutput(request.schema_name))
        }
    }

    struct NoRetriever;

    #[async_trait]
    impl GuidelineRetriever for NoRetriever {
        async fn retrieve(&self, _query: &str) -> Result<Vec<GuidelineDocument>> {
            Ok(vec![])
        }
    }

    fn settings(run_dir: PathBuf) -> PipelineSettings {
        PipelineSettings {
            run_dir,
            filter_active: true,
            max_parallel_matches: 4,
            timeout: None,
            today: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
        }
    }

    #[test]
    fn test_workflow_graph_verifies() {
        let pipeline = CasePipeline::new(
            Arc::new(NoExtractor),
            Arc::new(NoRetriever),
            settings(PathBuf::from("out")),
        );
        let workflow = pipeline.build_workflow().unwrap();

        assert_eq!(
            workflow.handler_names(),
            vec![
                patient::STAGE,
                bundler::STAGE,
                aggregate::DISPATCH_STAGE,
                matcher::STAGE,
                aggregate::GATHER_STAGE,
                summary::STAGE,
            ]
        );
    }

    #[test]
    fn test_settings_from_config() {
        let config = WorkflowConfig {
            output_dir: PathBuf::from("/tmp/cases"),
            timeout_seconds: 0,
            max_parallel_matches: 8,
            filter_active: false,
            verbose: false,
        };
        let settings = PipelineSettings::from_config(&config);

        assert_eq!(settings.run_dir, PathBuf::from("/tmp/cases/workflow_output"));
        assert!(settings.timeout.is_none());
        assert_eq!(settings.max_parallel_matches, 8);
        assert!(!settings.filter_active);
    }

    #[tokio::test]
    async fn test_missing_bundle_is_input_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let pipeline = CasePipeline::new(
            Arc::new(NoExtractor),
            Arc::new(NoRetriever),
            settings(dir.path().join("run")),
        );

        let err = pipeline
            .run(dir.path().join("missing.json"), LogSink::disabled())
            .await
            .unwrap_err();
        assert!(err.root().is_input_error());
        assert!(pipeline.store().dir().is_dir());
    }
}
