//! Handler trait

use super::context::RunContext;
use super::event::{Event, EventKind};
use crate::domain::Result;
use async_trait::async_trait;

/// A pipeline step subscribed to exactly one event kind
///
/// Handlers return the events they emit; the engine routes them only after
/// `handle` has returned, so any context write made inside `handle`
/// happens before any emitted event is processed.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Stable name used in logs and error reports
    fn name(&self) -> &'static str;

    /// The event kind this handler consumes
    fn accepts(&self) -> EventKind;

    /// Every event kind this handler may emit
    fn emits(&self) -> &'static [EventKind];

    /// Maximum simultaneous invocations; queued events wait in FIFO order
    fn max_workers(&self) -> usize {
        1
    }

    async fn handle(&self, event: Event, ctx: &RunContext) -> Result<Vec<Event>>;
}
