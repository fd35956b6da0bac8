//! Poisson-process generator

use super::{build_generated, EventGenerator, NextEvent, PayloadFactory};
use crate::models::{EventError, Payload, Sequencer};
use crate::rng::RngManager;

/// Emits events whose inter-arrival gaps are exponentially distributed
///
/// With rate λ the expected number of events per unit of time is λ. Each
/// generator draws from its own seeded [`RngManager`]; the next gap is drawn
/// once and cached until the event is generated, so peeking the next time
/// does not advance the random stream.
///
/// # Example
/// ```
/// use event_simulator_core_rs::generators::{EventGenerator, PoissonGenerator};
///
/// let mut arrivals = PoissonGenerator::new("arrivals", "customer_arrival", 2.0, 42);
/// let first = arrivals.generate_next_time(0.0).unwrap();
/// assert_eq!(arrivals.generate_next_time(0.0), Some(first));
/// ```
pub struct PoissonGenerator {
    id: String,
    event_type: String,
    rate: f64,
    rng: RngManager,
    /// Time of the last generated event (or the start time)
    clock: f64,
    /// Drawn but not yet generated next time
    pending: Option<f64>,
    end: Option<f64>,
    exhausted: bool,
    payload_factory: Option<PayloadFactory>,
}

impl PoissonGenerator {
    pub fn new(id: impl Into<String>, event_type: impl Into<String>, rate: f64, seed: u64) -> Self {
        Self {
            id: id.into(),
            event_type: event_type.into(),
            rate,
            rng: RngManager::new(seed),
            clock: 0.0,
            pending: None,
            end: None,
            exhausted: false,
            payload_factory: None,
        }
    }

    /// Measure the first gap from `start` instead of zero
    pub fn starting_at(mut self, start: f64) -> Self {
        self.clock = start;
        self
    }

    /// Exhaust the stream once the next arrival would be later than `end`
    pub fn until(mut self, end: f64) -> Self {
        self.end = Some(end);
        self
    }

    /// Attach a payload to every generated event
    pub fn with_payload(mut self, factory: impl Fn(f64) -> Payload + 'static) -> Self {
        self.payload_factory = Some(Box::new(factory));
        self
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl EventGenerator for PoissonGenerator {
    fn id(&self) -> &str {
        &self.id
    }

    fn generate_next_time(&mut self, current_time: f64) -> Option<f64> {
        if self.exhausted {
            return None;
        }
        if let Some(time) = self.pending {
            return Some(time);
        }
        if !(self.rate > 0.0 && self.rate.is_finite()) {
            self.exhausted = true;
            return None;
        }

        let base = self.clock.max(current_time);
        if self.end.is_some_and(|end| base >= end) {
            self.exhausted = true;
            return None;
        }

        let time = base + self.rng.exponential(self.rate);
        if self.end.is_some_and(|end| time > end) {
            self.exhausted = true;
            return None;
        }

        self.pending = Some(time);
        Some(time)
    }

    fn generate(
        &mut self,
        current_time: f64,
        sequencer: &mut Sequencer,
    ) -> Result<NextEvent, EventError> {
        let Some(time) = self.generate_next_time(current_time) else {
            return Ok(NextEvent::Exhausted);
        };

        let event = build_generated(
            &self.id,
            &self.event_type,
            time,
            self.payload_factory.as_ref(),
            sequencer,
        )?;
        self.pending = None;
        self.clock = time;
        Ok(NextEvent::Ready(event))
    }
}
