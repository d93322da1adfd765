//! `handle_guideline_match`: one scattered branch per condition bundle
//!
//! Generates search queries, retrieves guideline text for each, de-duplicates
//! documents by id (first occurrence wins) and asks for one recommendation.

use super::{prompts, unexpected_event};
use crate::adapters::llm::{extract, StructuredExtractor};
use crate::adapters::retrieval::{GuidelineDocument, GuidelineRetriever};
use crate::domain::{
    CasewiseError, GuidelineMatch, GuidelineQueries, GuidelineRecommendation, Result,
};
use crate::engine::{Event, EventKind, Handler, RunContext};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

pub const STAGE: &str = "handle_guideline_match";

const PREVIEW_CHARS: usize = 200;

pub struct HandleGuidelineMatch {
    pub(crate) extractor: Arc<dyn StructuredExtractor>,
    pub(crate) retriever: Arc<dyn GuidelineRetriever>,
    pub(crate) max_workers: usize,
}

#[async_trait]
impl Handler for HandleGuidelineMatch {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn accepts(&self) -> EventKind {
        EventKind::MatchGuideline
    }

    fn emits(&self) -> &'static [EventKind] {
        &[EventKind::MatchGuidelineResult]
    }

    fn max_workers(&self) -> usize {
        self.max_workers
    }

    async fn handle(&self, event: Event, ctx: &RunContext) -> Result<Vec<Event>> {
        let kind = event.kind();
        let Event::MatchGuideline(bundle) = event else {
            return Err(unexpected_event(STAGE, kind));
        };

        let patient = ctx.patient()?;
        let demographics = patient.demographic_str();
        let bundle_json = bundle.to_prompt_json();

        let queries: GuidelineQueries = extract(
            self.extractor.as_ref(),
            prompts::guideline_query_messages(&demographics, &bundle_json),
        )
        .await
        .map_err(|e| CasewiseError::extraction(STAGE, e))?;

        let mut results = Vec::with_capacity(queries.queries.len());
        for query in &queries.queries {
            ctx.log(STAGE, format!("Generating query: {query}"));
            results.push(self.retriever.retrieve(query).await?);
        }

        let documents = dedup_documents(results);
        let guideline_text = join_documents(&documents);
        ctx.log(
            STAGE,
            format!("Found guidelines: {}...", preview(&guideline_text, PREVIEW_CHARS)),
        );

        let recommendation: GuidelineRecommendation = extract(
            self.extractor.as_ref(),
            prompts::guideline_recommendation_messages(&demographics, &bundle_json, &guideline_text),
        )
        .await
        .map_err(|e| CasewiseError::extraction(STAGE, e))?;

        ctx.log(
            STAGE,
            format!(
                "Guideline recommendation for {}: {}",
                bundle.condition.display, recommendation.recommendation_summary
            ),
        );
        tracing::info!(
            stage = STAGE,
            condition = %bundle.condition.display,
            queries = queries.queries.len(),
            documents = documents.len(),
            "Guideline matched"
        );

        Ok(vec![Event::MatchGuidelineResult(GuidelineMatch::new(
            bundle,
            recommendation,
        ))])
    }
}

/// Flattens per-query results, keeping the first occurrence of each id
pub fn dedup_documents(results: Vec<Vec<GuidelineDocument>>) -> Vec<GuidelineDocument> {
    let mut seen = HashSet::new();
    results
        .into_iter()
        .flatten()
        .filter(|doc| seen.insert(doc.id.clone()))
        .collect()
}

pub fn join_documents(documents: &[GuidelineDocument]) -> String {
    documents
        .iter()
        .map(|doc| doc.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
