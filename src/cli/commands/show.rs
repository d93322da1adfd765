//! Show command implementation
//!
//! This module implements the `show` command for displaying the cached
//! artifacts of a run directory.

use crate::config::load_config;
use crate::core::store::ArtifactStore;
use crate::domain::{CaseSummary, ConditionBundleSet, GuidelineMatch, PatientRecord};
use clap::Args;
use std::path::PathBuf;

const CELL_WIDTH: usize = 40;

/// Arguments for the show command
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Output directory of the run (defaults to workflow.output_dir from the config)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

impl ShowArgs {
    /// Execute the show command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let output_dir = match &self.output_dir {
            Some(dir) => dir.clone(),
            None => match load_config(config_path) {
                Ok(config) => config.workflow.output_dir,
                Err(e) => {
                    println!("❌ Failed to load configuration file");
                    println!("   Error: {e}");
                    return Ok(2);
                }
            },
        };

        let store = ArtifactStore::new(output_dir.join("workflow_output"));
        tracing::info!(run_dir = %store.dir().display(), "Showing run artifacts");

        println!("📂 Run directory: {}", store.dir().display());
        println!();

        let patient = store.load_patient().await?;
        let bundles = store.load_bundles().await?;
        let matches = store.load_matches().await?;
        let summary = store.load_case_summary().await?;

        if patient.is_none() && bundles.is_none() && matches.is_none() && summary.is_none() {
            println!("No cached artifacts found.");
            println!("Run 'casewise run <BUNDLE_JSON>' to produce them.");
            return Ok(0);
        }

        if let Some(patient) = &patient {
            println!("{}", render_patient(patient));
        }
        if let Some(bundles) = &bundles {
            println!("{}", render_bundles(bundles));
        }
        if let Some(matches) = &matches {
            println!("{}", render_matches(matches));
        }
        if let Some(summary) = &summary {
            println!("{}", render_summary(summary));
        }

        Ok(0)
    }
}

/// Shortens `text` to the column width, on a character boundary
fn cell(text: &str) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() <= CELL_WIDTH {
        return single_line;
    }
    let mut short: String = single_line.chars().take(CELL_WIDTH - 3).collect();
    short.push_str("...");
    short
}

fn heading(title: &str) -> Vec<String> {
    vec![title.to_string(), "-".repeat(120)]
}

fn render_patient(patient: &PatientRecord) -> String {
    let mut lines = heading("Patient Info");
    lines.push(format!("  Name:        {}", patient.full_name()));
    lines.push(format!("  Birth date:  {}", patient.birth_date));
    lines.push(format!("  Gender:      {}", patient.gender));
    lines.push(String::new());

    lines.push(format!("  {:<42} {:<20} {:<15}", "Condition", "Code", "Status"));
    for condition in &patient.conditions {
        lines.push(format!(
            "  {:<42} {:<20} {:<15}",
            cell(&condition.display),
            condition.code,
            condition.clinical_status
        ));
    }
    lines.push(String::new());

    lines.push(format!("  {:<28} {:<42} {:<42}", "Encounter date", "Type", "Reason"));
    for encounter in &patient.recent_encounters {
        lines.push(format!(
            "  {:<28} {:<42} {:<42}",
            encounter.date,
            cell(encounter.type_display.as_deref().unwrap_or("-")),
            cell(encounter.reason_display.as_deref().unwrap_or("-"))
        ));
    }
    lines.push(String::new());

    lines.push(format!("  {:<42} {:<28} {:<42}", "Medication", "Start date", "Instructions"));
    for medication in &patient.current_medications {
        lines.push(format!(
            "  {:<42} {:<28} {:<42}",
            cell(&medication.name),
            medication.start_date.as_deref().unwrap_or("-"),
            cell(medication.instructions.as_deref().unwrap_or("-"))
        ));
    }
    lines.push(String::new());
    lines.join("\n")
}

fn render_bundles(bundles: &ConditionBundleSet) -> String {
    let mut lines = heading(&format!("Condition Bundles ({})", bundles.len()));
    lines.push(format!("  {:<42} {:<12} {:<12}", "Condition", "Encounters", "Medications"));
    for bundle in &bundles.bundles {
        lines.push(format!(
            "  {:<42} {:<12} {:<12}",
            cell(&bundle.condition.display),
            bundle.encounters.len(),
            bundle.medications.len()
        ));
    }
    lines.push(String::new());
    lines.join("\n")
}

fn render_matches(matches: &[GuidelineMatch]) -> String {
    let mut lines = heading(&format!("Guideline Recommendations ({})", matches.len()));
    lines.push(format!("  {:<42} {:<42} {:<30}", "Condition", "Source", "Reference"));
    for matched in matches {
        let recommendation = &matched.recommendation;
        lines.push(format!(
            "  {:<42} {:<42} {:<30}",
            cell(&matched.bundle.condition.display),
            cell(&recommendation.guideline_source),
            cell(recommendation.reference_section.as_deref().unwrap_or("-"))
        ));
        lines.push(format!("      {}", recommendation.recommendation_summary));
    }
    lines.push(String::new());
    lines.join("\n")
}

fn render_summary(summary: &CaseSummary) -> String {
    let mut lines = heading("Case Summary");
    lines.push(summary.render());
    lines.push(String::new());
    lines.join("\n")
}
