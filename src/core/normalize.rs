//! Record normalizer
//!
//! Deterministic transform from a FHIR bundle to a [`PatientRecord`].
//!
//! Rules:
//! - exactly one `Patient` resource is required
//! - conditions with an administrative display in [`EXCLUDED_CONDITIONS`] are
//!   dropped; with `filter_active`, so is anything whose clinical status is not
//!   `active`
//! - encounters are sorted ascending by `period.start` (missing or unparseable
//!   dates first, ties keep bundle order) and only the last
//!   [`MAX_RECENT_ENCOUNTERS`] are kept
//! - only `active` medication requests are kept

use crate::adapters::fhir::{
    Bundle, CodeableConcept, ConditionResource, EncounterResource, MedicationRequestResource,
    PatientResource, Resource,
};
use crate::domain::{CasewiseError, Condition, Encounter, Medication, PatientRecord, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::path::Path;

/// Administrative condition displays that never reach the pipeline
pub const EXCLUDED_CONDITIONS: [&str; 2] = [
    "Medication review due (situation)",
    "Risk activity involvement (finding)",
];

pub const MAX_RECENT_ENCOUNTERS: usize = 3;

const UNKNOWN: &str = "Unknown";
const UNKNOWN_STATUS: &str = "unknown";
const UNKNOWN_MEDICATION: &str = "Unknown Medication";

/// Parses bundle JSON text
pub fn parse_bundle(json: &str) -> Result<Bundle> {
    serde_json::from_str(json)
        .map_err(|e| CasewiseError::Input(format!("Malformed FHIR bundle: {e}")))
}

/// Reads and parses a bundle file
pub async fn load_bundle_file(path: impl AsRef<Path>) -> Result<Bundle> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
        CasewiseError::Input(format!("Cannot read bundle {}: {}", path.display(), e))
    })?;
    parse_bundle(&contents)
}

/// Builds the normalized patient record
pub fn normalize_bundle(bundle: &Bundle, filter_active: bool) -> Result<PatientRecord> {
    let mut patients = Vec::new();
    let mut conditions = Vec::new();
    let mut encounters = Vec::new();
    let mut medications = Vec::new();

    for resource in bundle.resources() {
        match resource {
            Resource::Patient(p) => patients.push(p),
            Resource::Condition(c) => conditions.push(c),
            Resource::Encounter(e) => encounters.push(e),
            Resource::MedicationRequest(m) => medications.push(m),
            Resource::Other => {}
        }
    }

    let patient = match patients.as_slice() {
        [patient] => *patient,
        [] => {
            return Err(CasewiseError::Input(
                "No Patient resource found in the bundle".to_string(),
            ))
        }
        many => {
            return Err(CasewiseError::Input(format!(
                "Expected exactly one Patient resource, found {}",
                many.len()
            )))
        }
    };

    let (given_name, family_name) = patient_names(patient);

    let record = PatientRecord {
        given_name,
        family_name,
        birth_date: patient.birth_date.clone().unwrap_or_default(),
        gender: patient.gender.clone().unwrap_or_default(),
        conditions: conditions
            .into_iter()
            .map(normalize_condition)
            .filter(|c| !EXCLUDED_CONDITIONS.contains(&c.display.as_str()))
            .filter(|c| !filter_active || c.is_active())
            .collect(),
        recent_encounters: recent_encounters(encounters),
        current_medications: medications
            .into_iter()
            .filter(|m| m.status.as_deref() == Some("active"))
            .map(normalize_medication)
            .collect(),
    };

    tracing::debug!(
        conditions = record.conditions.len(),
        encounters = record.recent_encounters.len(),
        medications = record.current_medications.len(),
        "Normalized patient record"
    );

    Ok(record)
}

fn patient_names(patient: &PatientResource) -> (String, String) {
    match patient.name.first() {
        Some(name) => (
            name.given.first().cloned().unwrap_or_default(),
            name.family.clone().unwrap_or_default(),
        ),
        None => (String::new(), String::new()),
    }
}

fn normalize_condition(resource: &ConditionResource) -> Condition {
    let coding = resource.code.as_ref().and_then(CodeableConcept::first_coding);
    let status = resource
        .clinical_status
        .as_ref()
        .and_then(CodeableConcept::first_code)
        .unwrap_or(UNKNOWN_STATUS);

    Condition::new(
        coding.and_then(|c| c.code.clone()).unwrap_or_else(|| UNKNOWN.to_string()),
        coding.and_then(|c| c.display.clone()).unwrap_or_else(|| UNKNOWN.to_string()),
        status,
    )
}

fn recent_encounters(mut encounters: Vec<&EncounterResource>) -> Vec<Encounter> {
    // Stable sort keeps bundle order among equal keys
    encounters.sort_by_key(|e| e.start().and_then(parse_timestamp));

    let skip = encounters.len().saturating_sub(MAX_RECENT_ENCOUNTERS);
    encounters
        .into_iter()
        .skip(skip)
        .map(|e| Encounter {
            date: e.start().unwrap_or_default().to_string(),
            reason_display: e
                .reason_code
                .first()
                .and_then(CodeableConcept::first_display)
                .map(str::to_string),
            type_display: e
                .encounter_type
                .first()
                .and_then(CodeableConcept::first_display)
                .map(str::to_string),
        })
        .collect()
}

fn normalize_medication(resource: &MedicationRequestResource) -> Medication {
    Medication {
        name: resource
            .medication_codeable_concept
            .as_ref()
            .and_then(CodeableConcept::first_display)
            .unwrap_or(UNKNOWN_MEDICATION)
            .to_string(),
        start_date: resource.authored_on.clone(),
        instructions: resource
            .dosage_instruction
            .first()
            .and_then(|d| d.text.clone()),
    }
}

/// Parses the ISO-8601 forms found in FHIR `dateTime` values, normalised to UTC
fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
