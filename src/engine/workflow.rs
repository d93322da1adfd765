//! Workflow graph and run loop

use super::context::RunContext;
use super::event::{Event, EventKind};
use super::handler::Handler;
use super::log::LogSink;
use crate::domain::{CaseSummary, CasewiseError, Result, WorkflowError};
use crate::{log_stage_complete, log_stage_start};
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Collects handlers and verifies the event graph they form
///
/// # Example
///
/// ```no_run
/// use casewise::engine::{Event, LogSink, WorkflowBuilder};
/// # use casewise::engine::Handler;
///
/// # async fn example(start_handler: impl Handler + 'static) -> casewise::domain::Result<()> {
/// let workflow = WorkflowBuilder::new().handler(start_handler).build()?;
/// let summary = workflow
///     .run(Event::Start { bundle_path: "patient.json".into() }, LogSink::disabled())
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct WorkflowBuilder {
    handlers: Vec<Arc<dyn Handler>>,
    timeout: Option<Duration>,
}

impl WorkflowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handler(mut self, handler: impl Handler + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Bounds a whole run; `None` waits indefinitely
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Checks the graph and produces a runnable workflow
    ///
    /// # Errors
    ///
    /// - two handlers consume the same kind
    /// - nothing consumes the start event
    /// - a declared emission has no consumer
    /// - nothing emits the stop event
    pub fn build(self) -> std::result::Result<Workflow, WorkflowError> {
        let mut routes = HashMap::new();
        for (index, handler) in self.handlers.iter().enumerate() {
            if routes.insert(handler.accepts(), index).is_some() {
                return Err(WorkflowError::DuplicateHandler(
                    handler.accepts().to_string(),
                ));
            }
        }

        if !routes.contains_key(&EventKind::Start) {
            return Err(WorkflowError::MissingStartHandler);
        }

        let mut terminal = false;
        for handler in &self.handlers {
            for kind in handler.emits() {
                if *kind == EventKind::Stop {
                    terminal = true;
                } else if !routes.contains_key(kind) {
                    return Err(WorkflowError::UnconsumedEvent {
                        handler: handler.name().to_string(),
                        kind: kind.to_string(),
                    });
                }
            }
        }

        if !terminal {
            return Err(WorkflowError::NoTerminalEmitter);
        }

        Ok(Workflow {
            handlers: self.handlers,
            routes,
            timeout: self.timeout,
        })
    }
}

type Invocation = BoxFuture<'static, (usize, Result<Vec<Event>>)>;

/// A verified handler graph
pub struct Workflow {
    handlers: Vec<Arc<dyn Handler>>,
    routes: HashMap<EventKind, usize>,
    timeout: Option<Duration>,
}

impl Workflow {
    /// Handler names in registration order
    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    /// Runs one workflow instance from `start` until a handler emits `Stop`
    ///
    /// A fresh [`RunContext`] is created for the run and discarded afterwards.
    /// Any handler failure aborts the run; in-flight invocations are dropped.
    pub async fn run(&self, start: Event, log: LogSink) -> Result<CaseSummary> {
        let ctx = RunContext::new(log);
        let span = tracing::info_span!("run", run_id = %ctx.run_id());

        let driven = self.drive(start, &ctx).instrument(span);
        match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, driven).await {
                Ok(result) => result,
                Err(_) => Err(WorkflowError::Timeout(limit.as_secs()).into()),
            },
            None => driven.await,
        }
    }

    async fn drive(&self, start: Event, ctx: &RunContext) -> Result<CaseSummary> {
        let mut queues: Vec<VecDeque<Event>> = vec![VecDeque::new(); self.handlers.len()];
        let mut running: Vec<usize> = vec![0; self.handlers.len()];
        let mut in_flight: FuturesUnordered<Invocation> = FuturesUnordered::new();

        let start_index = self.route(start.kind())?;
        queues[start_index].push_back(start);

        loop {
            for (index, handler) in self.handlers.iter().enumerate() {
                let limit = handler.max_workers().max(1);
                while running[index] < limit {
                    let Some(event) = queues[index].pop_front() else {
                        break;
                    };
                    running[index] += 1;
                    in_flight.push(self.invoke(index, event, ctx));
                }
            }

            let Some((index, outcome)) = in_flight.next().await else {
                let (pending_gather, _) = ctx.match_progress();
                return Err(WorkflowError::Stalled { pending_gather }.into());
            };
            running[index] -= 1;

            let handler = &self.handlers[index];
            let emitted = outcome.map_err(|source| WorkflowError::Handler {
                handler: handler.name().to_string(),
                source: Box::new(source),
            })?;

            for event in emitted {
                let kind = event.kind();
                if !handler.emits().contains(&kind) {
                    return Err(WorkflowError::UndeclaredEmission {
                        handler: handler.name().to_string(),
                        kind: kind.to_string(),
                    }
                    .into());
                }

                match event {
                    Event::Stop(summary) => return Ok(summary),
                    event => {
                        let target = self.route(kind)?;
                        queues[target].push_back(event);
                    }
                }
            }
        }
    }

    fn route(&self, kind: EventKind) -> Result<usize> {
        self.routes.get(&kind).copied().ok_or_else(|| {
            CasewiseError::Workflow(WorkflowError::UnconsumedEvent {
                handler: "engine".to_string(),
                kind: kind.to_string(),
            })
        })
    }

    fn invoke(&self, index: usize, event: Event, ctx: &RunContext) -> Invocation {
        let handler = Arc::clone(&self.handlers[index]);
        let ctx = ctx.clone();
        let span = tracing::debug_span!("handler", handler = handler.name());

        Box::pin(
            async move {
                let started = Instant::now();
                log_stage_start!(handler.name());
                let outcome = handler.handle(event, &ctx).await;
                if outcome.is_ok() {
                    log_stage_complete!(handler.name(), started.elapsed());
                }
                (index, outcome)
            }
            .instrument(span),
        )
    }
}
