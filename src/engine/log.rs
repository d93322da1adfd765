//! Run progress stream
//!
//! Purely observational: nothing in a run ever reads it back.

use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// One progress entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEvent {
    /// Handler that wrote the entry
    pub stage: String,
    pub message: String,

    /// Partial output (a streamed fragment) rather than a complete line
    pub delta: bool,
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.delta {
            f.write_str(&self.message)
        } else {
            write!(f, ">> {}", self.message)
        }
    }
}

/// Sending half of the progress stream
///
/// A disabled sink drops entries after mirroring them to `tracing`.
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    tx: Option<UnboundedSender<LogEvent>>,
}

impl LogSink {
    /// Creates a sink and the receiver the caller drains during the run
    pub fn channel() -> (Self, UnboundedReceiver<LogEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn emit(&self, stage: &str, message: impl Into<String>) {
        self.send(stage, message.into(), false);
    }

    pub fn emit_delta(&self, stage: &str, fragment: impl Into<String>) {
        self.send(stage, fragment.into(), true);
    }

    fn send(&self, stage: &str, message: String, delta: bool) {
        tracing::debug!(stage = stage, delta = delta, "{}", message);

        if let Some(tx) = &self.tx {
            // A closed receiver only means nobody is watching any more
            let _ = tx.send(LogEvent {
                stage: stage.to_string(),
                message,
                delta,
            });
        }
    }
}
