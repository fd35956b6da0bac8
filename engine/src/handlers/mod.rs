//! Event handlers
//!
//! A handler reacts to a dispatched event. It may read and write statistics
//! and returns the events it spawns; the dispatcher inserts those into the
//! timeline.
//!
//! # Lifecycle
//!
//! [`EventHandler::handle`] is the fixed algorithm every dispatch goes through:
//!
//! ```text
//! pre_handle  ──► can_handle? ──yes──► process_event ──► post_handle
//!                      │                                     ▲
//!                      └──────────────no─────────────────────┘
//! ```
//!
//! The hooks always run; `process_event` only runs when `can_handle` accepts
//! the event. Spawned events of all three steps are concatenated in that
//! order. Implementors supply `process_event` and override the hooks as
//! needed; `handle` itself is not meant to be overridden.
//!
//! Handlers may push events and use the timeline's sequencer, but must not
//! pop or clear it. The dispatcher turns either into a fatal
//! [`HandlerFault::TimelineMutated`].
//!
//! # Example
//!
//! ```
//! use event_simulator_core_rs::handlers::{EventHandler, HandlerResult, Outcome};
//! use event_simulator_core_rs::models::Event;
//! use event_simulator_core_rs::{Stats, Timeline};
//!
//! struct Departures;
//!
//! impl EventHandler for Departures {
//!     fn id(&self) -> &str {
//!         "departures"
//!     }
//!
//!     fn process_event(
//!         &mut self,
//!         event: &Event,
//!         timeline: &mut Timeline,
//!         _stats: &mut Stats,
//!     ) -> HandlerResult<Outcome> {
//!         let departure = Event::builder(event.time() + 1.0, "departure")
//!             .source(self.id())
//!             .build(timeline.sequencer())?;
//!         Ok(Outcome::spawn(vec![departure]))
//!     }
//! }
//!
//! let mut timeline = Timeline::new(0.0);
//! let mut stats = Stats::new();
//! let arrival = Event::builder(2.0, "arrival").build(timeline.sequencer()).unwrap();
//!
//! let outcome = Departures.handle(&arrival, &mut timeline, &mut stats).unwrap();
//! assert_eq!(outcome.spawned[0].time(), 3.0);
//! ```

mod chain;
mod collector;
mod conditional;
mod dispatcher;
mod logging;

pub use chain::ChainHandler;
pub use collector::StatsCollectingHandler;
pub use conditional::ConditionalHandler;
pub use dispatcher::{EventDispatcher, FaultRecord};
pub use logging::{LogSink, LoggingEventHandler};

use crate::models::{Event, EventError};
use crate::stats::{Stats, StatsError};
use crate::timeline::{TimeOrderViolation, Timeline};
use thiserror::Error;

/// Failure raised by a handler
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HandlerFault {
    #[error("{0}")]
    Failed(String),

    #[error("Invalid spawned event: {0}")]
    InvalidEvent(#[from] EventError),

    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error(transparent)]
    TimeOrder(#[from] TimeOrderViolation),

    #[error("Handler took {removed} event(s) off the timeline")]
    TimelineMutated { removed: u64 },
}

impl HandlerFault {
    /// Generic failure with a message
    pub fn failed(message: impl Into<String>) -> Self {
        HandlerFault::Failed(message.into())
    }

    /// Faults that abort the run regardless of the fault policy
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HandlerFault::TimeOrder(_) | HandlerFault::TimelineMutated { .. }
        )
    }
}

pub type HandlerResult<T> = Result<T, HandlerFault>;

/// Whether later handlers in the same list still see the event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Propagation {
    #[default]
    Continue,
    Stop,
}

/// What a handler produced for one event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    pub spawned: Vec<Event>,
    pub propagation: Propagation,
}

impl Outcome {
    /// No spawned events, propagation continues
    pub fn none() -> Self {
        Self::default()
    }

    pub fn spawn(spawned: Vec<Event>) -> Self {
        Self {
            spawned,
            propagation: Propagation::Continue,
        }
    }

    /// Same outcome, but stop propagation
    pub fn stop(mut self) -> Self {
        self.propagation = Propagation::Stop;
        self
    }

    pub fn stops(&self) -> bool {
        self.propagation == Propagation::Stop
    }
}

/// Reacts to dispatched events
pub trait EventHandler {
    /// Identifier used in logs and fault records
    fn id(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Whether `process_event` runs for this event
    fn can_handle(&self, _event: &Event) -> bool {
        true
    }

    /// Runs before `can_handle` is consulted
    fn pre_handle(
        &mut self,
        _event: &Event,
        _timeline: &mut Timeline,
        _stats: &mut Stats,
    ) -> HandlerResult<Vec<Event>> {
        Ok(Vec::new())
    }

    /// The handler's reaction to an accepted event
    fn process_event(
        &mut self,
        event: &Event,
        timeline: &mut Timeline,
        stats: &mut Stats,
    ) -> HandlerResult<Outcome>;

    /// Runs last, seeing everything spawned so far
    fn post_handle(
        &mut self,
        _event: &Event,
        _spawned: &[Event],
        _timeline: &mut Timeline,
        _stats: &mut Stats,
    ) -> HandlerResult<Vec<Event>> {
        Ok(Vec::new())
    }

    /// Full handling lifecycle; see the module docs
    fn handle(
        &mut self,
        event: &Event,
        timeline: &mut Timeline,
        stats: &mut Stats,
    ) -> HandlerResult<Outcome> {
        let mut spawned = self.pre_handle(event, timeline, stats)?;
        let mut propagation = Propagation::Continue;

        if self.can_handle(event) {
            let outcome = self.process_event(event, timeline, stats)?;
            spawned.extend(outcome.spawned);
            propagation = outcome.propagation;
        }

        let late = self.post_handle(event, &spawned, timeline, stats)?;
        spawned.extend(late);

        Ok(Outcome {
            spawned,
            propagation,
        })
    }
}

impl<H: EventHandler + ?Sized> EventHandler for Box<H> {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn can_handle(&self, event: &Event) -> bool {
        (**self).can_handle(event)
    }

    fn pre_handle(
        &mut self,
        event: &Event,
        timeline: &mut Timeline,
        stats: &mut Stats,
    ) -> HandlerResult<Vec<Event>> {
        (**self).pre_handle(event, timeline, stats)
    }

    fn process_event(
        &mut self,
        event: &Event,
        timeline: &mut Timeline,
        stats: &mut Stats,
    ) -> HandlerResult<Outcome> {
        (**self).process_event(event, timeline, stats)
    }

    fn post_handle(
        &mut self,
        event: &Event,
        spawned: &[Event],
        timeline: &mut Timeline,
        stats: &mut Stats,
    ) -> HandlerResult<Vec<Event>> {
        (**self).post_handle(event, spawned, timeline, stats)
    }

    fn handle(
        &mut self,
        event: &Event,
        timeline: &mut Timeline,
        stats: &mut Stats,
    ) -> HandlerResult<Outcome> {
        (**self).handle(event, timeline, stats)
    }
}
