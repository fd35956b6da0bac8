//! Event generators
//!
//! A generator lazily produces the events of one logical stream, one at a
//! time. The engine pulls from it: it asks for the next candidate, holds that
//! candidate on the timeline until it is dispatched, and only then asks again.
//!
//! # Key Principles
//!
//! 1. **Pull-based**: streams are never materialized eagerly; they may be infinite
//! 2. **Side-effect free peeking**: `generate_next_time` may be called repeatedly
//!    and returns the same time until `generate` consumes it
//! 3. **Explicit exhaustion**: the end of a stream is a value, not an error
//! 4. **Determinism**: stochastic generators own an explicitly seeded RNG
//!
//! # Example
//!
//! ```
//! use event_simulator_core_rs::generators::{EventGenerator, FixedIntervalGenerator, NextEvent};
//! use event_simulator_core_rs::models::Sequencer;
//!
//! let mut seq = Sequencer::new();
//! let mut ticks = FixedIntervalGenerator::new("clock", "tick", 1.0, 2.0).with_limit(2);
//!
//! assert_eq!(ticks.generate_next_time(0.0), Some(1.0));
//! assert!(matches!(ticks.generate(0.0, &mut seq), Ok(NextEvent::Ready(e)) if e.time() == 1.0));
//! assert!(matches!(ticks.generate(1.0, &mut seq), Ok(NextEvent::Ready(e)) if e.time() == 3.0));
//! assert!(matches!(ticks.generate(3.0, &mut seq), Ok(NextEvent::Exhausted)));
//! ```

mod composite;
mod fixed;
mod poisson;
mod scheduled;

pub use composite::CompositeGenerator;
pub use fixed::FixedIntervalGenerator;
pub use poisson::PoissonGenerator;
pub use scheduled::ScheduledGenerator;

use crate::models::{Event, EventError, Payload, Sequencer};
use crate::timeline::TimeOrderViolation;
use thiserror::Error;

/// Builds the payload of a generated event from its time
pub type PayloadFactory = Box<dyn Fn(f64) -> Payload>;

/// Result of asking a generator for its next event
#[derive(Debug, Clone, PartialEq)]
pub enum NextEvent {
    /// The next event of the stream
    Ready(Event),

    /// The stream has ended; the generator will produce nothing more
    Exhausted,
}

/// Strategy producing a lazy stream of events for one source
pub trait EventGenerator {
    /// Identifier of this generator; used as the `source` of its events
    fn id(&self) -> &str;

    /// Time of the next event, or `None` when the stream is exhausted
    ///
    /// Calling this again without an intervening `generate` returns the same
    /// answer.
    fn generate_next_time(&mut self, current_time: f64) -> Option<f64>;

    /// Advance the stream and return the event at `generate_next_time(current_time)`
    fn generate(
        &mut self,
        current_time: f64,
        sequencer: &mut Sequencer,
    ) -> Result<NextEvent, EventError>;
}

/// Why a generator stopped being asked for events
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Retirement {
    /// The generator reported the end of its stream
    Exhausted,

    /// The next candidate would fire after the horizon
    BeyondHorizon { next_time: f64 },
}

/// Failures while obtaining a generator candidate
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PrimeError {
    #[error("Generator '{generator}' built an invalid event: {source}")]
    InvalidEvent {
        generator: String,
        #[source]
        source: EventError,
    },

    #[error(transparent)]
    TimeOrder(#[from] TimeOrderViolation),
}

/// A registered generator together with its pending candidate
///
/// The slot enforces the at-most-one-candidate rule: the wrapped generator is
/// only asked for a new event once the previous candidate has been taken.
pub struct GeneratorSlot {
    generator: Box<dyn EventGenerator>,
    candidate: Option<Event>,
    retirement: Option<Retirement>,
    emitted: u64,
}

impl GeneratorSlot {
    pub fn new(generator: Box<dyn EventGenerator>) -> Self {
        Self {
            generator,
            candidate: None,
            retirement: None,
            emitted: 0,
        }
    }

    pub fn id(&self) -> &str {
        self.generator.id()
    }

    /// Whether the generator can still produce candidates
    pub fn is_active(&self) -> bool {
        self.retirement.is_none()
    }

    pub fn retirement(&self) -> Option<Retirement> {
        self.retirement
    }

    /// The computed but not yet dispatched event, if any
    pub fn candidate(&self) -> Option<&Event> {
        self.candidate.as_ref()
    }

    /// Number of candidates taken from this slot so far
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Remove the pending candidate so it can be dispatched
    pub(crate) fn take_candidate(&mut self) -> Option<Event> {
        let event = self.candidate.take();
        if event.is_some() {
            self.emitted += 1;
        }
        event
    }

    /// Make sure an active generator has a candidate
    ///
    /// Does nothing when a candidate is already pending or the slot is retired.
    /// Returns the retirement when this call retired the generator.
    ///
    /// # Errors
    /// * `PrimeError::InvalidEvent` - the generator failed to construct its event
    /// * `PrimeError::TimeOrder` - the candidate is earlier than `now`
    pub fn prime(
        &mut self,
        now: f64,
        horizon: Option<f64>,
        sequencer: &mut Sequencer,
    ) -> Result<Option<Retirement>, PrimeError> {
        if self.retirement.is_some() || self.candidate.is_some() {
            return Ok(None);
        }

        let next_time = match self.generator.generate_next_time(now) {
            Some(time) => time,
            None => return Ok(Some(self.retire(Retirement::Exhausted))),
        };

        if let Some(horizon) = horizon {
            if next_time > horizon {
                return Ok(Some(self.retire(Retirement::BeyondHorizon { next_time })));
            }
        }

        let generated = self
            .generator
            .generate(now, sequencer)
            .map_err(|source| PrimeError::InvalidEvent {
                generator: self.generator.id().to_string(),
                source,
            })?;

        let event = match generated {
            NextEvent::Ready(event) => event,
            NextEvent::Exhausted => return Ok(Some(self.retire(Retirement::Exhausted))),
        };

        if event.time() < now {
            return Err(TimeOrderViolation {
                event,
                current_time: now,
            }
            .into());
        }

        self.candidate = Some(event);
        Ok(None)
    }

    fn retire(&mut self, reason: Retirement) -> Retirement {
        self.retirement = Some(reason);
        reason
    }
}

impl std::fmt::Debug for GeneratorSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorSlot")
            .field("id", &self.id())
            .field("candidate", &self.candidate)
            .field("retirement", &self.retirement)
            .field("emitted", &self.emitted)
            .finish()
    }
}

/// Build the event shared by the built-in generators
pub(crate) fn build_generated(
    id: &str,
    event_type: &str,
    time: f64,
    payload_factory: Option<&PayloadFactory>,
    sequencer: &mut Sequencer,
) -> Result<Event, EventError> {
    let payload = payload_factory.map(|factory| factory(time)).unwrap_or_default();
    Event::builder(time, event_type)
        .source(id)
        .payload(payload)
        .build(sequencer)
}
