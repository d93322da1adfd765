//! End-to-end tests for the case pipeline with scripted collaborators
//!
//! These tests verify that:
//! - Every condition is matched exactly once and gathered before the summary
//! - An empty condition set still produces a summary
//! - A rerun over a complete run directory calls no collaborator
//! - Failures abort the run and name the stage that raised them

mod common;

use casewise::adapters::retrieval::GuidelineDocument;
use casewise::core::pipeline::CasePipeline;
use casewise::core::store::Artifact;
use casewise::domain::{CasewiseError, ExtractionError, WorkflowError};
use casewise::engine::{LogEvent, LogSink};
use common::{case_extractor, settings, write_bundle, InMemoryRetriever, ScriptedExtractor};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn drain(receiver: &mut tokio::sync::mpsc::UnboundedReceiver<LogEvent>) -> Vec<LogEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_two_conditions_end_to_end() {
    let dir = TempDir::new().unwrap();
    let bundle = write_bundle(dir.path(), &["Asthma", "Atopic dermatitis"]);
    let extractor = Arc::new(case_extractor(&["Asthma", "Atopic dermatitis"]));
    let retriever = Arc::new(InMemoryRetriever::new(vec![]));

    let pipeline = CasePipeline::new(
        extractor.clone(),
        retriever.clone(),
        settings(dir.path().join("workflow_output")),
    );
    let (log, mut receiver) = LogSink::channel();
    let summary = pipeline.run(&bundle, log).await.unwrap();

    // Age comes from the birth date, not the service
    assert_eq!(summary.age, 9);
    assert_eq!(summary.patient_name, "Ana Lopez");
    assert_eq!(summary.condition_summaries.len(), 2);

    assert_eq!(extractor.calls("ConditionBundles"), 1);
    assert_eq!(extractor.calls("GuidelineQueries"), 2);
    assert_eq!(extractor.calls("GuidelineRecommendation"), 2);
    assert_eq!(extractor.calls("CaseSummary"), 1);
    assert_eq!(retriever.calls(), 6);

    let store = pipeline.store();
    for artifact in Artifact::ALL {
        assert!(store.exists(artifact), "{artifact} missing");
    }

    let matches = store.load_matches().await.unwrap().unwrap();
    let mut gathered: Vec<_> = matches
        .iter()
        .map(|m| m.bundle.condition.display.as_str())
        .collect();
    gathered.sort();
    assert_eq!(gathered, vec!["Asthma", "Atopic dermatitis"]);

    let events = drain(&mut receiver);
    assert!(events
        .iter()
        .any(|e| e.stage == "handle_guideline_match" && e.message.starts_with("Generating query:")));
    assert!(events
        .iter()
        .any(|e| e.stage == "generate_output" && e.message == "Generating case summary"));
    assert!(events
        .iter()
        .any(|e| e.delta && e.message == "Patient Name: Ana Lopez\n"));
}

#[tokio::test]
async fn test_no_conditions_still_produces_summary() {
    let dir = TempDir::new().unwrap();
    let bundle = write_bundle(dir.path(), &[]);
    let extractor = Arc::new(case_extractor(&[]));
    let retriever = Arc::new(InMemoryRetriever::new(vec![]));

    let pipeline = CasePipeline::new(
        extractor.clone(),
        retriever.clone(),
        settings(dir.path().join("workflow_output")),
    );
    let summary = pipeline.run(&bundle, LogSink::disabled()).await.unwrap();

    assert!(summary.condition_summaries.is_empty());
    assert_eq!(extractor.calls("GuidelineQueries"), 0);
    assert_eq!(extractor.calls("CaseSummary"), 1);
    assert_eq!(retriever.calls(), 0);

    let raw = std::fs::read_to_string(pipeline.store().path(Artifact::GuidelineRecommendations))
        .unwrap();
    assert!(raw.is_empty());
}

#[tokio::test]
async fn test_no_conditions_ignores_invented_condition_summaries() {
    let dir = TempDir::new().unwrap();
    let bundle = write_bundle(dir.path(), &[]);
    let extractor = Arc::new(case_extractor(&[]).respond_with(
        "CaseSummary",
        json!({
            "patient_name": "Ana Lopez",
            "age": 9,
            "overall_assessment": "Healthy child.",
            "condition_summaries": [
                {"condition_display": "Hypertension", "summary": "Well controlled"}
            ]
        }),
    ));

    let pipeline = CasePipeline::new(
        extractor,
        Arc::new(InMemoryRetriever::new(vec![])),
        settings(dir.path().join("workflow_output")),
    );
    let summary = pipeline.run(&bundle, LogSink::disabled()).await.unwrap();

    assert!(summary.condition_summaries.is_empty());
    let cached = pipeline.store().load_case_summary().await.unwrap().unwrap();
    assert!(cached.condition_summaries.is_empty());
}

#[tokio::test]
async fn test_summary_condition_count_mismatch_names_stage() {
    let dir = TempDir::new().unwrap();
    let bundle = write_bundle(dir.path(), &["Asthma", "Atopic dermatitis"]);
    let extractor = Arc::new(
        case_extractor(&["Asthma", "Atopic dermatitis"]).respond_with(
            "CaseSummary",
            json!({
                "patient_name": "Ana Lopez",
                "age": 9,
                "overall_assessment": "Mild atopy.",
                "condition_summaries": [
                    {"condition_display": "Asthma", "summary": "Controlled"}
                ]
            }),
        ),
    );

    let pipeline = CasePipeline::new(
        extractor,
        Arc::new(InMemoryRetriever::new(vec![])),
        settings(dir.path().join("workflow_output")),
    );
    let err = pipeline.run(&bundle, LogSink::disabled()).await.unwrap_err();

    match &err {
        CasewiseError::Workflow(WorkflowError::Handler { handler, .. }) => {
            assert_eq!(handler, "generate_output");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(matches!(
        err.root(),
        CasewiseError::Extraction {
            source: ExtractionError::SchemaMismatch { .. },
            ..
        }
    ));
    assert!(!pipeline.store().exists(Artifact::CaseSummary));
}

#[tokio::test]
async fn test_rerun_reuses_every_artifact() {
    let dir = TempDir::new().unwrap();
    let bundle = write_bundle(dir.path(), &["Asthma", "Atopic dermatitis"]);
    let run_dir = dir.path().join("workflow_output");

    let first = CasePipeline::new(
        Arc::new(case_extractor(&["Asthma", "Atopic dermatitis"])),
        Arc::new(InMemoryRetriever::new(vec![])),
        settings(run_dir.clone()),
    )
    .run(&bundle, LogSink::disabled())
    .await
    .unwrap();

    // The bundle is not read again either
    std::fs::remove_file(&bundle).unwrap();

    let extractor = Arc::new(ScriptedExtractor::new());
    let retriever = Arc::new(InMemoryRetriever::new(vec![]));
    let second = CasePipeline::new(extractor.clone(), retriever.clone(), settings(run_dir))
        .run(&bundle, LogSink::disabled())
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(extractor.total_calls(), 0);
    assert_eq!(retriever.calls(), 0);
}

#[tokio::test]
async fn test_resume_recomputes_only_missing_stage() {
    let dir = TempDir::new().unwrap();
    let bundle = write_bundle(dir.path(), &["Asthma"]);
    let run_dir = dir.path().join("workflow_output");

    let pipeline = CasePipeline::new(
        Arc::new(case_extractor(&["Asthma"])),
        Arc::new(InMemoryRetriever::new(vec![])),
        settings(run_dir.clone()),
    );
    pipeline.run(&bundle, LogSink::disabled()).await.unwrap();
    std::fs::remove_file(pipeline.store().path(Artifact::CaseSummary)).unwrap();

    let extractor = Arc::new(case_extractor(&["Asthma"]));
    let summary = CasePipeline::new(
        extractor.clone(),
        Arc::new(InMemoryRetriever::new(vec![])),
        settings(run_dir),
    )
    .run(&bundle, LogSink::disabled())
    .await
    .unwrap();

    assert_eq!(extractor.total_calls(), 1);
    assert_eq!(extractor.calls("CaseSummary"), 1);
    assert_eq!(summary.condition_summaries[0].condition_display, "Asthma");
}

#[tokio::test]
async fn test_retrieved_documents_deduplicated_across_queries() {
    let dir = TempDir::new().unwrap();
    let bundle = write_bundle(dir.path(), &["Asthma"]);
    let extractor = Arc::new(case_extractor(&["Asthma"]));
    let retriever = Arc::new(InMemoryRetriever::new(vec![
        GuidelineDocument::new("gina#0", "Inhaled corticosteroids reduce exacerbations."),
        GuidelineDocument::new("gina#1", "Review inhaler technique."),
    ]));

    CasePipeline::new(
        extractor.clone(),
        retriever.clone(),
        settings(dir.path().join("workflow_output")),
    )
    .run(&bundle, LogSink::disabled())
    .await
    .unwrap();

    let prompts = extractor.prompts_for("GuidelineRecommendation");
    assert_eq!(prompts.len(), 1);
    let prompt = &prompts[0];

    assert_eq!(prompt.matches("Inhaled corticosteroids reduce exacerbations.").count(), 1);
    assert_eq!(prompt.matches("Review inhaler technique.").count(), 1);
    for query in retriever.queries() {
        assert!(prompt.contains(&format!("Guidance for {query}.")));
    }

    let shared = prompt.find("Inhaled corticosteroids").unwrap();
    let unique = prompt.find("Guidance for").unwrap();
    assert!(shared < unique, "first-seen order not preserved");
}

#[tokio::test]
async fn test_gather_waits_for_slow_branches() {
    let conditions = ["Asthma", "Atopic dermatitis", "Otitis media", "Anemia", "Obesity"];
    let names: Vec<String> = conditions.iter().map(|c| c.to_string()).collect();

    let dir = TempDir::new().unwrap();
    let bundle = write_bundle(dir.path(), &conditions);
    let extractor = Arc::new(case_extractor(&conditions).with_delay(move |request| {
        if request.schema_name != "GuidelineRecommendation" {
            return Duration::ZERO;
        }
        // Earlier-scattered branches finish later
        let position = common::condition_in(request, &names)
            .and_then(|c| names.iter().position(|n| *n == c))
            .unwrap_or(0);
        Duration::from_millis(50 * (names.len() - position) as u64)
    }));

    let mut run_settings = settings(dir.path().join("workflow_output"));
    run_settings.max_parallel_matches = conditions.len();

    let pipeline = CasePipeline::new(
        extractor.clone(),
        Arc::new(InMemoryRetriever::new(vec![])),
        run_settings,
    );
    let summary = pipeline.run(&bundle, LogSink::disabled()).await.unwrap();

    assert_eq!(extractor.calls("CaseSummary"), 1);
    assert_eq!(summary.condition_summaries.len(), conditions.len());

    // Gathered in arrival order, which here is the reverse of scatter order
    let matches = pipeline.store().load_matches().await.unwrap().unwrap();
    let arrival: Vec<_> = matches
        .iter()
        .map(|m| m.bundle.condition.display.clone())
        .collect();
    let mut reversed: Vec<String> = conditions.iter().map(|c| c.to_string()).collect();
    reversed.reverse();
    assert_eq!(arrival, reversed);
}

#[tokio::test]
async fn test_recommendation_failure_names_stage() {
    let dir = TempDir::new().unwrap();
    let bundle = write_bundle(dir.path(), &["Asthma", "Atopic dermatitis"]);
    let extractor = Arc::new(case_extractor(&["Asthma", "Atopic dermatitis"]).respond(
        "GuidelineRecommendation",
        |_| Ok(json!({"guideline_source": "GINA"})),
    ));

    let pipeline = CasePipeline::new(
        extractor.clone(),
        Arc::new(InMemoryRetriever::new(vec![])),
        settings(dir.path().join("workflow_output")),
    );
    let err = pipeline.run(&bundle, LogSink::disabled()).await.unwrap_err();

    match &err {
        CasewiseError::Workflow(WorkflowError::Handler { handler, .. }) => {
            assert_eq!(handler, "handle_guideline_match");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(matches!(
        err.root(),
        CasewiseError::Extraction {
            source: ExtractionError::SchemaMismatch { .. },
            ..
        }
    ));

    // No partial result reaches the downstream artifacts
    assert!(!pipeline.store().exists(Artifact::GuidelineRecommendations));
    assert!(!pipeline.store().exists(Artifact::CaseSummary));
    assert_eq!(extractor.calls("CaseSummary"), 0);
}

#[tokio::test]
async fn test_bundle_without_patient_is_input_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("no_patient.json");
    std::fs::write(
        &path,
        json!({"resourceType": "Bundle", "entry": [
            {"resource": {"resourceType": "Condition", "code": {"coding": [{"display": "Asthma"}]}}}
        ]})
        .to_string(),
    )
    .unwrap();

    let extractor = Arc::new(case_extractor(&["Asthma"]));
    let pipeline = CasePipeline::new(
        extractor.clone(),
        Arc::new(InMemoryRetriever::new(vec![])),
        settings(dir.path().join("workflow_output")),
    );
    let err = pipeline.run(&path, LogSink::disabled()).await.unwrap_err();

    assert!(err.root().is_input_error());
    assert_eq!(extractor.total_calls(), 0);
    assert!(!pipeline.store().exists(Artifact::PatientInfo));
}

#[tokio::test]
async fn test_run_timeout_fails_whole_run() {
    let dir = TempDir::new().unwrap();
    let bundle = write_bundle(dir.path(), &["Asthma"]);
    let extractor = Arc::new(
        case_extractor(&["Asthma"]).with_delay(|_| Duration::from_secs(5)),
    );

    let mut run_settings = settings(dir.path().join("workflow_output"));
    run_settings.timeout = Some(Duration::from_millis(100));

    let pipeline = CasePipeline::new(
        extractor,
        Arc::new(InMemoryRetriever::new(vec![])),
        run_settings,
    );
    let err = pipeline.run(&bundle, LogSink::disabled()).await.unwrap_err();

    assert!(matches!(err, CasewiseError::Workflow(WorkflowError::Timeout(_))));
    assert!(!pipeline.store().exists(Artifact::CaseSummary));
}
