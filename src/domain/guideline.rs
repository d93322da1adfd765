//! Guideline search queries and recommendations

use super::bundle::ConditionBundle;
use serde::{Deserialize, Serialize};

/// Search queries generated for one condition bundle
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GuidelineQueries {
    #[serde(default)]
    pub queries: Vec<String>,
}

/// Recommendation produced for one condition bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidelineRecommendation {
    /// Origin of the guideline (e.g. "NHLBI Asthma Guidelines")
    pub guideline_source: String,

    /// Concise summary of the relevant recommendation
    pub recommendation_summary: String,

    /// Specific section or reference in the guideline
    #[serde(default)]
    pub reference_section: Option<String>,
}

/// A condition bundle paired with its recommendation
///
/// One line of `guideline_recommendations.jsonl`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidelineMatch {
    pub bundle: ConditionBundle,
    pub recommendation: GuidelineRecommendation,
}

impl GuidelineMatch {
    pub fn new(bundle: ConditionBundle, recommendation: GuidelineRecommendation) -> Self {
        Self {
            bundle,
            recommendation,
        }
    }

    /// Per-condition block fed into the case-summary prompt
    pub fn to_prompt_block(&self) -> String {
        let recommendation = serde_json::to_string(&self.recommendation).unwrap_or_default();
        format!(
            "**Condition Info**:\n{}\n\n**Recommendation**:\n{}\n",
            self.bundle.to_prompt_json(),
            recommendation
        )
    }
}
