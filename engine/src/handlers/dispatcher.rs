//! Routing of events to handlers
//!
//! Handlers are registered either for one event type or as defaults
//! (wildcards). Dispatching an event runs, in registration order, first the
//! handlers registered for its type and then the default handlers. A `Stop`
//! ends the list it was returned in; the default list still runs after a
//! typed handler stopped.
//!
//! # Fault isolation
//!
//! A failing handler is recorded as a [`FaultRecord`] and skipped: the
//! remaining handlers still see the event and the events it spawned are
//! discarded. When the dispatcher is set to abort on faults, or the fault is
//! fatal, dispatch stops and the record is returned as an error instead.
//! Fatal faults are time-order violations and handlers that take events off
//! the timeline (`pop_next`, `clear`).

use super::{EventHandler, HandlerFault, Propagation};
use crate::models::Event;
use crate::stats::Stats;
use crate::timeline::Timeline;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

/// A handler failure, with the event it failed on
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
#[error("Handler '{handler}' failed on '{event_type}' at time {time} (sequence {sequence}): {fault}")]
pub struct FaultRecord {
    pub handler: String,
    pub event_type: String,
    pub time: f64,
    pub sequence: u64,
    #[serde(serialize_with = "fault_message")]
    pub fault: HandlerFault,
}

fn fault_message<S: serde::Serializer>(fault: &HandlerFault, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(fault)
}

/// Routes events to registered handlers
#[derive(Default)]
pub struct EventDispatcher {
    typed: BTreeMap<String, Vec<Box<dyn EventHandler>>>,
    defaults: Vec<Box<dyn EventHandler>>,
    abort_on_fault: bool,
    dispatch_counts: BTreeMap<String, u64>,
    faults: Vec<FaultRecord>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort dispatch on the first fault instead of isolating it
    pub fn with_abort_on_fault(mut self, abort: bool) -> Self {
        self.abort_on_fault = abort;
        self
    }

    pub fn set_abort_on_fault(&mut self, abort: bool) {
        self.abort_on_fault = abort;
    }

    /// Register a handler for `event_type`, or as a default when `None`
    ///
    /// # Example
    /// ```
    /// use event_simulator_core_rs::handlers::{EventDispatcher, StatsCollectingHandler};
    ///
    /// let mut dispatcher = EventDispatcher::new();
    /// dispatcher.register_handler("arrival", StatsCollectingHandler::new("arrivals"));
    /// dispatcher.register_handler(None, StatsCollectingHandler::new("everything"));
    /// assert_eq!(dispatcher.handler_count(), 2);
    /// ```
    pub fn register_handler<'a>(
        &mut self,
        event_type: impl Into<Option<&'a str>>,
        handler: impl EventHandler + 'static,
    ) {
        self.register_boxed(event_type, Box::new(handler));
    }

    pub fn register_boxed<'a>(
        &mut self,
        event_type: impl Into<Option<&'a str>>,
        handler: Box<dyn EventHandler>,
    ) {
        match event_type.into() {
            Some(event_type) => self
                .typed
                .entry(event_type.to_string())
                .or_default()
                .push(handler),
            None => self.defaults.push(handler),
        }
    }

    /// Deliver `event` to its handlers and collect what they spawned
    ///
    /// # Errors
    /// The fault record of the handler that aborted dispatch. Events spawned
    /// before the abort are dropped.
    pub fn dispatch(
        &mut self,
        event: &Event,
        timeline: &mut Timeline,
        stats: &mut Stats,
    ) -> Result<Vec<Event>, FaultRecord> {
        *self
            .dispatch_counts
            .entry(event.event_type().to_string())
            .or_insert(0) += 1;

        let mut spawned = Vec::new();
        let abort_on_fault = self.abort_on_fault;
        let faults = &mut self.faults;

        let typed = self
            .typed
            .get_mut(event.event_type())
            .map(|handlers| handlers.as_mut_slice())
            .unwrap_or_default();

        for handlers in [typed, self.defaults.as_mut_slice()] {
            for handler in handlers.iter_mut() {
                let removals = timeline.removals();
                let result = handler.handle(event, timeline, stats).and_then(|outcome| {
                    match timeline.removals() - removals {
                        0 => Ok(outcome),
                        removed => Err(HandlerFault::TimelineMutated { removed }),
                    }
                });
                match result {
                    Ok(outcome) => {
                        spawned.extend(outcome.spawned);
                        if outcome.propagation == Propagation::Stop {
                            break;
                        }
                    }
                    Err(fault) => {
                        let record = FaultRecord {
                            handler: handler.id().to_string(),
                            event_type: event.event_type().to_string(),
                            time: event.time(),
                            sequence: event.sequence(),
                            fault,
                        };
                        warn!(
                            handler = %record.handler,
                            event_type = %record.event_type,
                            time = record.time,
                            error = %record.fault,
                            "Handler fault"
                        );
                        faults.push(record.clone());
                        if abort_on_fault || record.fault.is_fatal() {
                            return Err(record);
                        }
                    }
                }
            }
        }

        Ok(spawned)
    }

    /// Number of handlers registered (typed and default)
    pub fn handler_count(&self) -> usize {
        self.typed.values().map(Vec::len).sum::<usize>() + self.defaults.len()
    }

    /// Handlers registered for exactly this type
    pub fn typed_handler_count(&self, event_type: &str) -> usize {
        self.typed.get(event_type).map_or(0, Vec::len)
    }

    pub fn dispatch_count(&self, event_type: &str) -> u64 {
        self.dispatch_counts.get(event_type).copied().unwrap_or(0)
    }

    pub fn dispatch_counts(&self) -> &BTreeMap<String, u64> {
        &self.dispatch_counts
    }

    pub fn total_dispatched(&self) -> u64 {
        self.dispatch_counts.values().sum()
    }

    /// Every fault recorded so far, in order
    pub fn faults(&self) -> &[FaultRecord] {
        &self.faults
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let typed: BTreeMap<&str, usize> = self
            .typed
            .iter()
            .map(|(event_type, handlers)| (event_type.as_str(), handlers.len()))
            .collect();
        f.debug_struct("EventDispatcher")
            .field("typed", &typed)
            .field("defaults", &self.defaults.len())
            .field("abort_on_fault", &self.abort_on_fault)
            .field("dispatch_counts", &self.dispatch_counts)
            .field("faults", &self.faults.len())
            .finish()
    }
}
