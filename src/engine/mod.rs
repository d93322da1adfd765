//! Event-driven orchestration engine
//!
//! A run is a closed graph of [`Handler`]s, each consuming one [`EventKind`]
//! and declaring the kinds it may emit. [`WorkflowBuilder::build`] rejects
//! graphs with unconsumed emissions before anything runs.
//!
//! Scheduling is cooperative: every handler invocation of a run is polled
//! from the task that called [`Workflow::run`]. Invocations interleave at
//! their await points (extraction calls, retrieval, file I/O), so one slow
//! call never blocks the others. Per-handler worker limits bound how many
//! invocations of the same handler are in flight; further events queue FIFO.
//!
//! Fan-out is a handler returning several events of one kind. Fan-in goes
//! through the [`Gather`] held in the [`RunContext`].

pub mod context;
pub mod event;
pub mod gather;
pub mod handler;
pub mod log;
pub mod workflow;

pub use context::RunContext;
pub use event::{Event, EventKind};
pub use gather::Gather;
pub use handler::Handler;
pub use log::{LogEvent, LogSink};
pub use workflow::{Workflow, WorkflowBuilder};
