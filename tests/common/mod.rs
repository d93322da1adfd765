//! Shared fixtures and collaborator doubles for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use casewise::adapters::llm::{ExtractionRequest, StructuredExtractor};
use casewise::adapters::retrieval::{GuidelineDocument, GuidelineRetriever};
use casewise::core::pipeline::PipelineSettings;
use casewise::domain::{ExtractionError, Result};
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub type Responder =
    Arc<dyn Fn(&ExtractionRequest) -> std::result::Result<Value, ExtractionError> + Send + Sync>;
pub type Delay = Arc<dyn Fn(&ExtractionRequest) -> Duration + Send + Sync>;

/// Extraction double answering per schema name and recording every prompt
#[derive(Default)]
pub struct ScriptedExtractor {
    responders: HashMap<String, Responder>,
    delay: Option<Delay>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(
        mut self,
        schema: &str,
        responder: impl Fn(&ExtractionRequest) -> std::result::Result<Value, ExtractionError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.responders.insert(schema.to_string(), Arc::new(responder));
        self
    }

    pub fn respond_with(self, schema: &str, value: Value) -> Self {
        self.respond(schema, move |_| Ok(value.clone()))
    }

    pub fn with_delay(
        mut self,
        delay: impl Fn(&ExtractionRequest) -> Duration + Send + Sync + 'static,
    ) -> Self {
        self.delay = Some(Arc::new(delay));
        self
    }

    /// Number of calls made for `schema`
    pub fn calls(&self, schema: &str) -> usize {
        self.prompts_for(schema).len()
    }

    pub fn total_calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// Concatenated message text of every call made for `schema`
    pub fn prompts_for(&self, schema: &str) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == schema)
            .map(|(_, prompt)| prompt.clone())
            .collect()
    }
}

#[async_trait]
impl StructuredExtractor for ScriptedExtractor {
    async fn predict(
        &self,
        request: ExtractionRequest,
    ) -> std::result::Result<Value, ExtractionError> {
        self.prompts
            .lock()
            .unwrap()
            .push((request.schema_name.clone(), prompt_text(&request)));

        if let Some(delay) = &self.delay {
            tokio::time::sleep(delay(&request)).await;
        }

        match self.responders.get(&request.schema_name) {
            Some(responder) => responder(&request),
            None => Err(ExtractionError::MissingOutput(format!(
                "no script for {}",
                request.schema_name
            ))),
        }
    }
}

pub fn prompt_text(request: &ExtractionRequest) -> String {
    request
        .messages
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// First of `conditions` whose bundle JSON appears in the prompt
pub fn condition_in(request: &ExtractionRequest, conditions: &[String]) -> Option<String> {
    let text = prompt_text(request);
    conditions
        .iter()
        .find(|c| text.contains(&format!("\"display\":\"{c}\"")))
        .cloned()
}

/// Extractor scripted for a full run over `conditions`
pub fn case_extractor(conditions: &[&str]) -> ScriptedExtractor {
    let names: Vec<String> = conditions.iter().map(|c| c.to_string()).collect();

    let bundles: Vec<Value> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            json!({
                "condition": {"code": format!("{}", 1000 + i), "display": name, "clinical_status": "active"},
                "encounters": [],
                "medications": []
            })
        })
        .collect();

    let query_names = names.clone();
    let recommendation_names = names.clone();
    let summary_names = names;

    ScriptedExtractor::new()
        .respond_with("ConditionBundles", json!({ "bundles": bundles }))
        .respond("GuidelineQueries", move |request| {
            let condition = condition_in(request, &query_names).unwrap_or_default();
            Ok(json!({
                "queries": [
                    format!("{condition} first-line treatment"),
                    format!("{condition} monitoring"),
                    format!("{condition} referral criteria"),
                ]
            }))
        })
        .respond("GuidelineRecommendation", move |request| {
            let condition = condition_in(request, &recommendation_names).unwrap_or_default();
            Ok(json!({
                "guideline_source": format!("{condition} guideline"),
                "recommendation_summary": format!("Manage {condition}"),
                "reference_section": "Section 1"
            }))
        })
        .respond("CaseSummary", move |request| {
            let text = prompt_text(request);
            let summaries: Vec<Value> = summary_names
                .iter()
                .filter(|c| text.contains(&format!("\"display\":\"{c}\"")))
                .map(|c| json!({"condition_display": c, "summary": format!("{c} is stable")}))
                .collect();
            Ok(json!({
                "patient_name": "Ana Lopez",
                "age": 0,
                "overall_assessment": "Stable overall",
                "condition_summaries": summaries
            }))
        })
}

/// Retrieval double returning scripted documents and counting queries
#[derive(Default)]
pub struct InMemoryRetriever {
    shared: Vec<GuidelineDocument>,
    queries: Mutex<Vec<String>>,
}

impl InMemoryRetriever {
    /// Every query returns `shared` followed by one document unique to the query
    pub fn new(shared: Vec<GuidelineDocument>) -> Self {
        Self {
            shared,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl GuidelineRetriever for InMemoryRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<GuidelineDocument>> {
        self.queries.lock().unwrap().push(query.to_string());
        let mut documents = self.shared.clone();
        documents.push(GuidelineDocument::new(
            format!("unique:{query}"),
            format!("Guidance for {query}."),
        ));
        Ok(documents)
    }
}

/// FHIR bundle with one patient and the given active conditions
pub fn bundle_json(conditions: &[&str]) -> Value {
    let mut entries = vec![json!({
        "resource": {
            "resourceType": "Patient",
            "name": [{"given": ["Ana"], "family": "Lopez"}],
            "birthDate": "2015-06-20",
            "gender": "female"
        }
    })];

    for (i, display) in conditions.iter().enumerate() {
        entries.push(json!({
            "resource": {
                "resourceType": "Condition",
                "code": {"coding": [{"code": format!("{}", 1000 + i), "display": display}]},
                "clinicalStatus": {"coding": [{"code": "active"}]}
            }
        }));
    }

    entries.push(json!({
        "resource": {
            "resourceType": "Encounter",
            "period": {"start": "2024-03-01T09:00:00+00:00"},
            "type": [{"coding": [{"display": "Well child visit"}]}]
        }
    }));
    entries.push(json!({
        "resource": {
            "resourceType": "MedicationRequest",
            "status": "active",
            "medicationCodeableConcept": {"coding": [{"display": "Fluticasone 44 mcg"}]},
            "dosageInstruction": [{"text": "2 puffs twice daily"}]
        }
    }));

    json!({"resourceType": "Bundle", "type": "collection", "entry": entries})
}

pub fn write_bundle(dir: &Path, conditions: &[&str]) -> PathBuf {
    let path = dir.join("patient_bundle.json");
    std::fs::write(&path, bundle_json(conditions).to_string()).unwrap();
    path
}

pub fn settings(run_dir: PathBuf) -> PipelineSettings {
    PipelineSettings {
        run_dir,
        filter_active: true,
        max_parallel_matches: 4,
        timeout: Some(Duration::from_secs(30)),
        today: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
    }
}
