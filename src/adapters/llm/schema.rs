//! Output schemas for structured extraction
//!
//! Each pipeline record that is produced by the extraction service names its
//! tool, publishes a JSON schema for it, and post-validates the parsed value.

use crate::domain::{
    CaseSummary, ConditionBundleSet, ExtractionError, GuidelineQueries, GuidelineRecommendation,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

/// Minimum number of guideline queries accepted from the service
pub const MIN_GUIDELINE_QUERIES: usize = 3;

/// Queries beyond this count are dropped
pub const MAX_GUIDELINE_QUERIES: usize = 5;

/// A record type the extraction service can be asked to produce
pub trait OutputSchema: DeserializeOwned + Send + Sized {
    /// Tool name sent to the service
    const NAME: &'static str;

    /// Tool description sent to the service
    const DESCRIPTION: &'static str;

    /// JSON schema of the tool parameters
    fn json_schema() -> Value;

    /// Checks the parsed value, possibly normalising it
    fn validate(self) -> Result<Self, ExtractionError> {
        Ok(self)
    }
}

fn mismatch<T: OutputSchema>(message: impl Into<String>) -> ExtractionError {
    ExtractionError::SchemaMismatch {
        schema: T::NAME.to_string(),
        message: message.into(),
    }
}

fn condition_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "code": {"type": "string"},
            "display": {"type": "string"},
            "clinical_status": {"type": "string"}
        },
        "required": ["code", "display", "clinical_status"]
    })
}

fn encounter_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "date": {"type": "string", "description": "Date of the encounter."},
            "reason_display": {"type": ["string", "null"], "description": "Reason for the encounter."},
            "type_display": {"type": ["string", "null"], "description": "Type or class of the encounter."}
        },
        "required": ["date"]
    })
}

fn medication_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": {"type": "string", "description": "Name of the medication."},
            "start_date": {"type": ["string", "null"], "description": "When the medication was prescribed."},
            "instructions": {"type": ["string", "null"], "description": "Dosage instructions."}
        },
        "required": ["name"]
    })
}

impl OutputSchema for ConditionBundleSet {
    const NAME: &'static str = "ConditionBundles";
    const DESCRIPTION: &'static str =
        "Each active condition with the encounters and medications relevant to it.";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "bundles": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "condition": condition_schema(),
                            "encounters": {"type": "array", "items": encounter_schema()},
                            "medications": {"type": "array", "items": medication_schema()}
                        },
                        "required": ["condition"]
                    }
                }
            },
            "required": ["bundles"]
        })
    }
}

impl OutputSchema for GuidelineQueries {
    const NAME: &'static str = "GuidelineQueries";
    const DESCRIPTION: &'static str =
        "A set of recommended queries to retrieve guideline sections relevant to the patient's condition.";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "queries": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Query strings used to search an index of medical guidelines."
                }
            },
            "required": ["queries"]
        })
    }

    fn validate(mut self) -> Result<Self, ExtractionError> {
        self.queries.retain(|q| !q.trim().is_empty());

        if self.queries.len() < MIN_GUIDELINE_QUERIES {
            return Err(mismatch::<Self>(format!(
                "expected at least {} queries, got {}",
                MIN_GUIDELINE_QUERIES,
                self.queries.len()
            )));
        }

        if self.queries.len() > MAX_GUIDELINE_QUERIES {
            tracing::warn!(
                received = self.queries.len(),
                kept = MAX_GUIDELINE_QUERIES,
                "Truncating guideline queries"
            );
            self.queries.truncate(MAX_GUIDELINE_QUERIES);
        }

        Ok(self)
    }
}

impl OutputSchema for GuidelineRecommendation {
    const NAME: &'static str = "GuidelineRecommendation";
    const DESCRIPTION: &'static str =
        "A guideline recommendation for one patient condition.";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "guideline_source": {
                    "type": "string",
                    "description": "The origin of the guideline (e.g., 'NHLBI Asthma Guidelines')."
                },
                "recommendation_summary": {
                    "type": "string",
                    "description": "A concise summary of the relevant recommendation."
                },
                "reference_section": {
                    "type": ["string", "null"],
                    "description": "Specific section or reference in the guideline."
                }
            },
            "required": ["guideline_source", "recommendation_summary"]
        })
    }

    fn validate(self) -> Result<Self, ExtractionError> {
        if self.recommendation_summary.trim().is_empty() {
            return Err(mismatch::<Self>("recommendation_summary is empty"));
        }
        Ok(self)
    }
}

impl OutputSchema for CaseSummary {
    const NAME: &'static str = "CaseSummary";
    const DESCRIPTION: &'static str =
        "A concise clinician-facing case summary with one narrative per condition.";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "patient_name": {"type": "string", "description": "The patient's name."},
                "age": {"type": "integer", "minimum": 0, "description": "The patient's age in years."},
                "overall_assessment": {
                    "type": "string",
                    "description": "A high-level summary synthesizing all conditions, encounters, medications, and guideline recommendations."
                },
                "condition_summaries": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "condition_display": {"type": "string", "description": "Human-readable name of the condition."},
                            "summary": {"type": "string", "description": "Narrative of the condition's status and management."}
                        },
                        "required": ["condition_display", "summary"]
                    }
                }
            },
            "required": ["patient_name", "age", "overall_assessment"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queries(n: usize) -> GuidelineQueries {
        GuidelineQueries {
            queries: (0..n).map(|i| format!("query {i}")).collect(),
        }
    }

    #[test]
    fn test_queries_below_minimum_rejected() {
        let err = queries(2).validate().unwrap_err();
        assert!(matches!(err, ExtractionError::SchemaMismatch { ref schema, .. } if schema == "GuidelineQueries"));
    }

    #[test]
    fn test_queries_above_maximum_truncated() {
        let validated = queries(7).validate().unwrap();
        assert_eq!(validated.queries.len(), MAX_GUIDELINE_QUERIES);
        assert_eq!(validated.queries[0], "query 0");
    }

    #[test]
    fn test_blank_queries_do_not_count() {
        let mut q = queries(2);
        q.queries.push("   ".to_string());
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_empty_recommendation_rejected() {
        let rec = GuidelineRecommendation {
            guideline_source: "GINA".to_string(),
            recommendation_summary: " ".to_string(),
            reference_section: None,
        };
        assert!(rec.validate().is_err());
    }

    #[test]
    fn test_schemas_declare_required_fields() {
        assert_eq!(ConditionBundleSet::json_schema()["required"][0], "bundles");
        assert_eq!(CaseSummary::json_schema()["properties"]["age"]["type"], "integer");
    }
}
