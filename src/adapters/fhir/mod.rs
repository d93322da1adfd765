//! FHIR R4 bundle models
//!
//! Only the fields the record normalizer reads are modelled. Unknown
//! resource types deserialize to [`Resource::Other`] and are skipped.

pub mod models;

pub use models::{
    Bundle, BundleEntry, CodeableConcept, Coding, ConditionResource, Dosage, EncounterResource,
    HumanName, MedicationRequestResource, PatientResource, Period, Resource,
};
