//! Case summary - the terminal artifact of a run

use serde::{Deserialize, Serialize};

/// Narrative for one condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionSummary {
    /// Human-readable name of the condition
    pub condition_display: String,

    /// Status, relevant encounters, medications and guideline recommendations
    pub summary: String,
}

/// Clinician-facing case summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseSummary {
    pub patient_name: String,

    /// Age in years
    pub age: u32,

    pub overall_assessment: String,

    #[serde(default)]
    pub condition_summaries: Vec<ConditionSummary>,
}

impl CaseSummary {
    /// Render as plain text
    pub fn render(&self) -> String {
        let mut lines = vec![
            format!("Patient Name: {}", self.patient_name),
            format!("Age: {} years", self.age),
            String::new(),
            "Overall Assessment:".to_string(),
            self.overall_assessment.clone(),
            String::new(),
        ];

        if self.condition_summaries.is_empty() {
            lines.push("No specific conditions were summarized.".to_string());
        } else {
            lines.push("Condition Summaries:".to_string());
            for summary in &self.condition_summaries {
                lines.push(format!("- {}:", summary.condition_display));
                lines.push(format!("  {}", summary.summary));
            }
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_with_conditions() {
        let summary = CaseSummary {
            patient_name: "Ana Lopez".to_string(),
            age: 9,
            overall_assessment: "Stable.".to_string(),
            condition_summaries: vec![ConditionSummary {
                condition_display: "Asthma".to_string(),
                summary: "Well controlled.".to_string(),
            }],
        };
        let rendered = summary.render();

        assert!(rendered.starts_with("Patient Name: Ana Lopez\nAge: 9 years\n"));
        assert!(rendered.contains("Condition Summaries:\n- Asthma:\n  Well controlled."));
    }

    #[test]
    fn test_render_without_conditions() {
        let summary = CaseSummary {
            patient_name: "Ana Lopez".to_string(),
            age: 9,
            overall_assessment: "Healthy.".to_string(),
            condition_summaries: vec![],
        };

        assert!(summary
            .render()
            .ends_with("No specific conditions were summarized."));
    }
}
