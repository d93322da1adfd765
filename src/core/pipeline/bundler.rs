//! `create_condition_bundles`: one extraction call grouping encounters and
//! medications under each condition

use super::{prompts, unexpected_event};
use crate::adapters::llm::{extract, StructuredExtractor};
use crate::core::store::ArtifactStore;
use crate::domain::{CasewiseError, ConditionBundleSet, Result};
use crate::engine::{Event, EventKind, Handler, RunContext};
use async_trait::async_trait;
use std::sync::Arc;

pub const STAGE: &str = "create_condition_bundles";

pub struct CreateConditionBundles {
    pub(crate) extractor: Arc<dyn StructuredExtractor>,
    pub(crate) store: ArtifactStore,
}

#[async_trait]
impl Handler for CreateConditionBundles {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn accepts(&self) -> EventKind {
        EventKind::PatientInfo
    }

    fn emits(&self) -> &'static [EventKind] {
        &[EventKind::ConditionBundles]
    }

    async fn handle(&self, event: Event, ctx: &RunContext) -> Result<Vec<Event>> {
        let kind = event.kind();
        let Event::PatientInfo(patient) = event else {
            return Err(unexpected_event(STAGE, kind));
        };

        let bundles = match self.store.load_bundles().await? {
            Some(cached) => {
                ctx.log(STAGE, "Loading condition bundles from cache");
                cached
            }
            None => {
                ctx.log(STAGE, "Bundling conditions with encounters and medications");
                let patient_json = serde_json::to_string(&*patient)?;
                let bundles: ConditionBundleSet = extract(
                    self.extractor.as_ref(),
                    prompts::condition_bundle_messages(&patient_json),
                )
                .await
                .map_err(|e| CasewiseError::extraction(STAGE, e))?;
                self.store.save_bundles(&bundles).await?;
                bundles
            }
        };

        tracing::info!(stage = STAGE, count = bundles.len(), "Condition bundles ready");
        Ok(vec![Event::ConditionBundles(bundles)])
    }
}
