//! `generate_output`: the case summary extraction call

use super::{prompts, unexpected_event};
use crate::adapters::llm::{extract, StructuredExtractor};
use crate::core::store::ArtifactStore;
use crate::adapters::llm::OutputSchema;
use crate::domain::{
    CaseSummary, CasewiseError, ExtractionError, GuidelineMatch, PatientRecord, Result,
};
use crate::engine::{Event, EventKind, Handler, RunContext};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

pub const STAGE: &str = "generate_output";

pub struct GenerateOutput {
    pub(crate) extractor: Arc<dyn StructuredExtractor>,
    pub(crate) store: ArtifactStore,
    pub(crate) today: NaiveDate,
}

/// Per-condition blocks fed to the summary prompt, blank-line separated
pub fn condition_guideline_info(matches: &[GuidelineMatch]) -> String {
    matches
        .iter()
        .map(GuidelineMatch::to_prompt_block)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Streams the rendered summary to the progress channel, one line per fragment
fn stream_summary(ctx: &RunContext, summary: &CaseSummary) {
    for line in summary.render().lines() {
        ctx.log_delta(STAGE, format!("{line}\n"));
    }
}

/// Holds the service to one condition summary per gathered match
///
/// With nothing gathered the list is emptied; otherwise a count mismatch is a
/// schema mismatch, since an invented or dropped condition must not reach the caller.
fn reconcile_conditions(
    mut summary: CaseSummary,
    matches: &[GuidelineMatch],
) -> std::result::Result<CaseSummary, ExtractionError> {
    if matches.is_empty() {
        if !summary.condition_summaries.is_empty() {
            tracing::warn!(
                stage = STAGE,
                received = summary.condition_summaries.len(),
                "Dropping condition summaries for a patient without conditions"
            );
            summary.condition_summaries.clear();
        }
        return Ok(summary);
    }

    if summary.condition_summaries.len() != matches.len() {
        return Err(ExtractionError::SchemaMismatch {
            schema: CaseSummary::NAME.to_string(),
            message: format!(
                "expected {} condition summaries, received {}",
                matches.len(),
                summary.condition_summaries.len()
            ),
        });
    }

    Ok(summary)
}

/// Replaces the service's age with the one computed from the birth date, when computable
fn reconcile_age(mut summary: CaseSummary, patient: &PatientRecord, today: NaiveDate) -> CaseSummary {
    if let Some(age) = patient.age_on(today) {
        if age != summary.age {
            tracing::warn!(
                reported = summary.age,
                computed = age,
                "Case summary age differs from birth date; using computed age"
            );
            summary.age = age;
        }
    }
    summary
}

#[async_trait]
impl Handler for GenerateOutput {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn accepts(&self) -> EventKind {
        EventKind::GenerateCaseSummary
    }

    fn emits(&self) -> &'static [EventKind] {
        &[EventKind::Stop]
    }

    async fn handle(&self, event: Event, ctx: &RunContext) -> Result<Vec<Event>> {
        let kind = event.kind();
        let Event::GenerateCaseSummary(matches) = event else {
            return Err(unexpected_event(STAGE, kind));
        };

        if let Some(cached) = self.store.load_case_summary().await? {
            ctx.log(STAGE, "Loading case summary from cache");
            stream_summary(ctx, &cached);
            return Ok(vec![Event::Stop(cached)]);
        }

        ctx.log(STAGE, "Generating case summary");
        let patient = ctx.patient()?;

        let summary = extract::<CaseSummary>(
            self.extractor.as_ref(),
            prompts::case_summary_messages(
                &patient.demographic_str(),
                &condition_guideline_info(&matches),
            ),
        )
        .await
        .and_then(|summary| reconcile_conditions(summary, &matches))
        .map_err(|e| CasewiseError::extraction(STAGE, e))?;

        let summary = reconcile_age(summary, &patient, self.today);
        self.store.save_case_summary(&summary).await?;
        stream_summary(ctx, &summary);

        Ok(vec![Event::Stop(summary)])
    }
}
