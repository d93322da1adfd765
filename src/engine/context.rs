//! Per-run execution context
//!
//! Created when a run starts and dropped when it ends; never shared between
//! runs. Every accessor is synchronous and releases the lock before returning,
//! so no lock is ever held across a suspension point.

use super::gather::Gather;
use super::log::LogSink;
use crate::domain::{GuidelineMatch, PatientRecord, WorkflowError};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, Default)]
struct ContextState {
    patient: Option<Arc<PatientRecord>>,
    matches: Gather<GuidelineMatch>,
}

/// Shared state handed to every handler invocation of one run
#[derive(Debug, Clone)]
pub struct RunContext {
    run_id: Uuid,
    state: Arc<Mutex<ContextState>>,
    log: LogSink,
}

impl RunContext {
    pub fn new(log: LogSink) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            state: Arc::new(Mutex::new(ContextState::default())),
            log,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Appends an entry to the run's progress stream
    pub fn log(&self, stage: &str, message: impl Into<String>) {
        self.log.emit(stage, message);
    }

    pub fn log_delta(&self, stage: &str, fragment: impl Into<String>) {
        self.log.emit_delta(stage, fragment);
    }

    fn lock(&self) -> MutexGuard<'_, ContextState> {
        // Handlers never panic while holding the lock; recover the data if one did
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_patient(&self, patient: Arc<PatientRecord>) {
        self.lock().patient = Some(patient);
    }

    pub fn patient(&self) -> Result<Arc<PatientRecord>, WorkflowError> {
        self.lock()
            .patient
            .clone()
            .ok_or(WorkflowError::MissingContextValue("patient"))
    }

    /// Records the guideline-match fan-out width; see [`Gather::expect`]
    pub fn expect_matches(
        &self,
        width: usize,
    ) -> Result<Option<Vec<GuidelineMatch>>, WorkflowError> {
        self.lock().matches.expect(width)
    }

    /// Offers one branch result; see [`Gather::offer`]
    pub fn offer_match(
        &self,
        result: GuidelineMatch,
    ) -> Result<Option<Vec<GuidelineMatch>>, WorkflowError> {
        self.lock().matches.offer(result)
    }

    /// (buffered, expected) guideline matches
    pub fn match_progress(&self) -> (usize, Option<usize>) {
        let state = self.lock();
        (state.matches.pending(), state.matches.expected())
    }
}
