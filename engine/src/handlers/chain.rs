//! Handler running a list of handlers in order

use super::{EventHandler, HandlerResult, Outcome};
use crate::models::Event;
use crate::stats::Stats;
use crate::timeline::Timeline;

/// Runs its handlers in order until one stops propagation
///
/// Each inner handler goes through its full lifecycle. Spawned events are
/// concatenated in handler order. A `Stop` from an inner handler ends the
/// chain but is not passed on: the chain itself lets propagation continue in
/// the dispatcher. A fault from an inner handler is the chain's fault.
pub struct ChainHandler {
    id: String,
    handlers: Vec<Box<dyn EventHandler>>,
}

impl ChainHandler {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            handlers: Vec::new(),
        }
    }

    /// Append a handler to the chain
    pub fn then(mut self, handler: impl EventHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn push(&mut self, handler: Box<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl EventHandler for ChainHandler {
    fn id(&self) -> &str {
        &self.id
    }

    fn process_event(
        &mut self,
        event: &Event,
        timeline: &mut Timeline,
        stats: &mut Stats,
    ) -> HandlerResult<Outcome> {
        let mut spawned = Vec::new();
        for handler in &mut self.handlers {
            let outcome = handler.handle(event, timeline, stats)?;
            let stop = outcome.stops();
            spawned.extend(outcome.spawned);
            if stop {
                break;
            }
        }
        Ok(Outcome::spawn(spawned))
    }
}
