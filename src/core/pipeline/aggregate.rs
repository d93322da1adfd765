//! Scatter and gather around the guideline matcher
//!
//! `dispatch_guideline_match` records the fan-out width in the run context
//! and then emits one `MatchGuideline` per bundle. The engine routes those
//! events only after the handler returns, so the width is always recorded
//! before the first branch can report back.
//!
//! `gather_guideline_match` offers each branch result to the context's
//! [`Gather`](crate::engine::Gather). The arrival that completes the set
//! receives it, persists it and emits the single `GenerateCaseSummary`.
//! An empty bundle set is released by the dispatcher through the same path.

use super::unexpected_event;
use crate::core::store::ArtifactStore;
use crate::domain::{GuidelineMatch, Result};
use crate::engine::{Event, EventKind, Handler, RunContext};
use async_trait::async_trait;

pub const DISPATCH_STAGE: &str = "dispatch_guideline_match";
pub const GATHER_STAGE: &str = "gather_guideline_match";

/// Persists the complete gathered set and builds the downstream event
async fn release(
    store: &ArtifactStore,
    stage: &str,
    ctx: &RunContext,
    matches: Vec<GuidelineMatch>,
) -> Result<Event> {
    store.save_matches(&matches).await?;
    ctx.log(
        stage,
        format!("Collected {} guideline recommendation(s)", matches.len()),
    );
    tracing::info!(stage = stage, count = matches.len(), "Guideline matches released");
    Ok(Event::GenerateCaseSummary(matches))
}

pub struct DispatchGuidelineMatch {
    pub(crate) store: ArtifactStore,
}

#[async_trait]
impl Handler for DispatchGuidelineMatch {
    fn name(&self) -> &'static str {
        DISPATCH_STAGE
    }

    fn accepts(&self) -> EventKind {
        EventKind::ConditionBundles
    }

    fn emits(&self) -> &'static [EventKind] {
        &[EventKind::MatchGuideline, EventKind::GenerateCaseSummary]
    }

    async fn handle(&self, event: Event, ctx: &RunContext) -> Result<Vec<Event>> {
        let kind = event.kind();
        let Event::ConditionBundles(bundles) = event else {
            return Err(unexpected_event(DISPATCH_STAGE, kind));
        };

        if let Some(cached) = self.store.load_matches().await? {
            ctx.log(DISPATCH_STAGE, "Loading guideline recommendations from cache");
            return Ok(vec![Event::GenerateCaseSummary(cached)]);
        }

        if let Some(empty) = ctx.expect_matches(bundles.len())? {
            ctx.log(DISPATCH_STAGE, "No conditions to match");
            return Ok(vec![release(&self.store, DISPATCH_STAGE, ctx, empty).await?]);
        }

        ctx.log(
            DISPATCH_STAGE,
            format!("Matching guidelines for {} condition(s)", bundles.len()),
        );
        Ok(bundles
            .bundles
            .into_iter()
            .map(Event::MatchGuideline)
            .collect())
    }
}

pub struct GatherGuidelineMatch {
    pub(crate) store: ArtifactStore,
}

#[async_trait]
impl Handler for GatherGuidelineMatch {
    fn name(&self) -> &'static str {
        GATHER_STAGE
    }

    fn accepts(&self) -> EventKind {
        EventKind::MatchGuidelineResult
    }

    fn emits(&self) -> &'static [EventKind] {
        &[EventKind::GenerateCaseSummary]
    }

    async fn handle(&self, event: Event, ctx: &RunContext) -> Result<Vec<Event>> {
        let kind = event.kind();
        let Event::MatchGuidelineResult(result) = event else {
            return Err(unexpected_event(GATHER_STAGE, kind));
        };

        match ctx.offer_match(result)? {
            Some(all) => Ok(vec![release(&self.store, GATHER_STAGE, ctx, all).await?]),
            None => {
                let (buffered, expected) = ctx.match_progress();
                tracing::debug!(
                    stage = GATHER_STAGE,
                    buffered = buffered,
                    expected = expected.unwrap_or_default(),
                    "Waiting for remaining guideline matches"
                );
                Ok(vec![])
            }
        }
    }
}
