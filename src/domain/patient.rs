//! Normalized patient record
//!
//! The record produced once per run by the record normalizer. Field names
//! match the persisted `patient_info.json` artifact.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A clinical condition extracted from the source bundle
///
/// Identity is `code` + `display`; duplicates are possible in source data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Coded identifier (SNOMED CT in Synthea output)
    pub code: String,

    /// Human-readable condition name
    pub display: String,

    /// Clinical status code (e.g. "active", "resolved")
    pub clinical_status: String,
}

impl Condition {
    /// Create a new condition
    pub fn new(
        code: impl Into<String>,
        display: impl Into<String>,
        clinical_status: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            display: display.into(),
            clinical_status: clinical_status.into(),
        }
    }

    /// Whether the clinical status is "active"
    pub fn is_active(&self) -> bool {
        self.clinical_status == "active"
    }
}

/// A recent encounter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encounter {
    /// Start of the encounter period, ISO formatted
    pub date: String,

    /// Reason for the encounter
    #[serde(default)]
    pub reason_display: Option<String>,

    /// Type or class of the encounter
    #[serde(default)]
    pub type_display: Option<String>,
}

/// An active medication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    /// Name of the medication
    pub name: String,

    /// When the medication was prescribed
    #[serde(default)]
    pub start_date: Option<String>,

    /// Dosage instructions
    #[serde(default)]
    pub instructions: Option<String>,
}

/// Normalized patient record
///
/// Exactly one instance exists per run. It is produced by the first stage and
/// is read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub given_name: String,
    pub family_name: String,
    pub birth_date: String,
    pub gender: String,

    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// At most three, ascending by date
    #[serde(default)]
    pub recent_encounters: Vec<Encounter>,

    /// Active medications only
    #[serde(default)]
    pub current_medications: Vec<Medication>,
}

impl PatientRecord {
    /// Demographics block used as prompt context
    pub fn demographic_str(&self) -> String {
        format!(
            "Given name: {}\nFamily name: {}\nBirth date: {}\nGender: {}",
            self.given_name, self.family_name, self.birth_date, self.gender
        )
    }

    /// Full display name
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
            .trim()
            .to_string()
    }

    /// Age in whole years on the given date, if the birth date parses
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        let birth = NaiveDate::parse_from_str(&self.birth_date, "%Y-%m-%d").ok()?;
        if birth > today {
            return None;
        }

        let mut years = today.year() - birth.year();
        if (today.month(), today.day()) < (birth.month(), birth.day()) {
            years -= 1;
        }
        u32::try_from(years).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> PatientRecord {
        PatientRecord {
            given_name: "Ana".to_string(),
            family_name: "Lopez".to_string(),
            birth_date: "2015-06-20".to_string(),
            gender: "female".to_string(),
            conditions: vec![],
            recent_encounters: vec![],
            current_medications: vec![],
        }
    }

    #[test]
    fn test_demographic_str() {
        let demographics = record().demographic_str();
        assert_eq!(
            demographics,
            "Given name: Ana\nFamily name: Lopez\nBirth date: 2015-06-20\nGender: female"
        );
    }

    #[test]
    fn test_age_before_and_after_birthday() {
        let patient = record();
        let before = NaiveDate::from_ymd_opt(2024, 6, 19).unwrap();
        let on = NaiveDate::from_ymd_opt(2024, 6, 20).unwrap();
        assert_eq!(patient.age_on(before), Some(8));
        assert_eq!(patient.age_on(on), Some(9));
    }

    #[test]
    fn test_age_unparseable_birth_date() {
        let mut patient = record();
        patient.birth_date = "unknown".to_string();
        assert_eq!(patient.age_on(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()), None);
    }

    #[test]
    fn test_serialization_field_names() {
        let mut patient = record();
        patient.conditions.push(Condition::new("195967001", "Asthma", "active"));
        let json = serde_json::to_value(&patient).unwrap();

        assert_eq!(json["given_name"], "Ana");
        assert_eq!(json["conditions"][0]["clinical_status"], "active");
        assert!(json["recent_encounters"].as_array().unwrap().is_empty());
        assert!(json["current_medications"].as_array().unwrap().is_empty());
    }
}
