//! `parse_patient_info`: start event to normalized patient record

use super::unexpected_event;
use crate::core::normalize::{load_bundle_file, normalize_bundle};
use crate::core::store::ArtifactStore;
use crate::domain::Result;
use crate::engine::{Event, EventKind, Handler, RunContext};
use async_trait::async_trait;
use std::sync::Arc;

pub const STAGE: &str = "parse_patient_info";

pub struct ParsePatientInfo {
    pub(crate) store: ArtifactStore,
    pub(crate) filter_active: bool,
}

#[async_trait]
impl Handler for ParsePatientInfo {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn accepts(&self) -> EventKind {
        EventKind::Start
    }

    fn emits(&self) -> &'static [EventKind] {
        &[EventKind::PatientInfo]
    }

    async fn handle(&self, event: Event, ctx: &RunContext) -> Result<Vec<Event>> {
        let kind = event.kind();
        let Event::Start { bundle_path } = event else {
            return Err(unexpected_event(STAGE, kind));
        };

        let patient = match self.store.load_patient().await? {
            Some(cached) => {
                ctx.log(STAGE, "Loading patient info from cache");
                cached
            }
            None => {
                ctx.log(STAGE, "Reading patient info");
                let bundle = load_bundle_file(&bundle_path).await?;
                let patient = normalize_bundle(&bundle, self.filter_active)?;
                self.store.save_patient(&patient).await?;
                patient
            }
        };

        ctx.log(
            STAGE,
            format!(
                "Patient: {} ({} conditions, {} encounters, {} medications)",
                patient.full_name(),
                patient.conditions.len(),
                patient.recent_encounters.len(),
                patient.current_medications.len()
            ),
        );

        let patient = Arc::new(patient);
        ctx.set_patient(Arc::clone(&patient));
        Ok(vec![Event::PatientInfo(patient)])
    }
}
