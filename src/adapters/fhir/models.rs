//! Serde models for the subset of FHIR R4 consumed from Synthea-style bundles

use serde::Deserialize;

/// A FHIR `Bundle` of type collection/transaction
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Bundle {
    #[serde(default)]
    pub entry: Vec<BundleEntry>,
}

impl Bundle {
    /// Iterates over the resources of every entry that carries one
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.entry.iter().filter_map(|e| e.resource.as_ref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BundleEntry {
    #[serde(default)]
    pub resource: Option<Resource>,
}

/// Resource entries discriminated by `resourceType`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "resourceType")]
pub enum Resource {
    Patient(PatientResource),
    Condition(ConditionResource),
    Encounter(EncounterResource),
    MedicationRequest(MedicationRequestResource),
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientResource {
    #[serde(default)]
    pub name: Vec<HumanName>,
    pub birth_date: Option<String>,
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HumanName {
    #[serde(default)]
    pub given: Vec<String>,
    pub family: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Coding {
    pub system: Option<String>,
    pub code: Option<String>,
    pub display: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodeableConcept {
    #[serde(default)]
    pub coding: Vec<Coding>,
    pub text: Option<String>,
}

impl CodeableConcept {
    /// First coding entry, if any
    pub fn first_coding(&self) -> Option<&Coding> {
        self.coding.first()
    }

    /// Display of the first coding entry
    pub fn first_display(&self) -> Option<&str> {
        self.first_coding().and_then(|c| c.display.as_deref())
    }

    /// Code of the first coding entry
    pub fn first_code(&self) -> Option<&str> {
        self.first_coding().and_then(|c| c.code.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionResource {
    pub code: Option<CodeableConcept>,
    pub clinical_status: Option<CodeableConcept>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Period {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterResource {
    pub period: Option<Period>,
    #[serde(default)]
    pub reason_code: Vec<CodeableConcept>,
    #[serde(default, rename = "type")]
    pub encounter_type: Vec<CodeableConcept>,
}

impl EncounterResource {
    pub fn start(&self) -> Option<&str> {
        self.period.as_ref().and_then(|p| p.start.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dosage {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationRequestResource {
    pub status: Option<String>,
    pub medication_codeable_concept: Option<CodeableConcept>,
    pub authored_on: Option<String>,
    #[serde(default)]
    pub dosage_instruction: Vec<Dosage>,
}
