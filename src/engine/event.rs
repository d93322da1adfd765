//! Events flowing between pipeline handlers

use crate::domain::{
    CaseSummary, ConditionBundle, ConditionBundleSet, GuidelineMatch, PatientRecord,
};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Every event a run can carry
#[derive(Debug, Clone)]
pub enum Event {
    /// Start signal; the path of the FHIR bundle to summarise
    Start { bundle_path: PathBuf },

    /// Normalized patient record
    PatientInfo(Arc<PatientRecord>),

    /// Condition bundles produced for the patient
    ConditionBundles(ConditionBundleSet),

    /// One scattered branch: match guidelines for this bundle
    MatchGuideline(ConditionBundle),

    /// One branch result
    MatchGuidelineResult(GuidelineMatch),

    /// The complete gathered set, in arrival order
    GenerateCaseSummary(Vec<GuidelineMatch>),

    /// Terminal result
    Stop(CaseSummary),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Start { .. } => EventKind::Start,
            Event::PatientInfo(_) => EventKind::PatientInfo,
            Event::ConditionBundles(_) => EventKind::ConditionBundles,
            Event::MatchGuideline(_) => EventKind::MatchGuideline,
            Event::MatchGuidelineResult(_) => EventKind::MatchGuidelineResult,
            Event::GenerateCaseSummary(_) => EventKind::GenerateCaseSummary,
            Event::Stop(_) => EventKind::Stop,
        }
    }
}

/// Discriminant of [`Event`], used as the handler routing key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Start,
    PatientInfo,
    ConditionBundles,
    MatchGuideline,
    MatchGuidelineResult,
    GenerateCaseSummary,
    Stop,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Start => "start",
            EventKind::PatientInfo => "patient_info",
            EventKind::ConditionBundles => "condition_bundles",
            EventKind::MatchGuideline => "match_guideline",
            EventKind::MatchGuidelineResult => "match_guideline_result",
            EventKind::GenerateCaseSummary => "generate_case_summary",
            EventKind::Stop => "stop",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
