//! Fixed-interval generator

use super::{build_generated, EventGenerator, NextEvent, PayloadFactory};
use crate::models::{EventError, Payload, Sequencer};

/// Emits events at `start`, `start + interval`, `start + 2·interval`, ...
///
/// Times are computed as `start + k·interval` rather than by repeated
/// addition, so long streams do not accumulate rounding drift.
///
/// # Example
/// ```
/// use event_simulator_core_rs::generators::{EventGenerator, FixedIntervalGenerator};
///
/// let mut odd = FixedIntervalGenerator::new("odd", "tick", 1.0, 2.0).until(5.0);
/// assert_eq!(odd.generate_next_time(0.0), Some(1.0));
/// ```
pub struct FixedIntervalGenerator {
    id: String,
    event_type: String,
    start: f64,
    interval: f64,
    emitted: u64,
    limit: Option<u64>,
    end: Option<f64>,
    payload_factory: Option<PayloadFactory>,
}

impl FixedIntervalGenerator {
    pub fn new(
        id: impl Into<String>,
        event_type: impl Into<String>,
        start: f64,
        interval: f64,
    ) -> Self {
        Self {
            id: id.into(),
            event_type: event_type.into(),
            start,
            interval,
            emitted: 0,
            limit: None,
            end: None,
            payload_factory: None,
        }
    }

    /// Stop after `count` events
    pub fn with_limit(mut self, count: u64) -> Self {
        self.limit = Some(count);
        self
    }

    /// Stop once the next time would be later than `end`
    pub fn until(mut self, end: f64) -> Self {
        self.end = Some(end);
        self
    }

    /// Attach a payload to every generated event
    pub fn with_payload(mut self, factory: impl Fn(f64) -> Payload + 'static) -> Self {
        self.payload_factory = Some(Box::new(factory));
        self
    }
}

impl EventGenerator for FixedIntervalGenerator {
    fn id(&self) -> &str {
        &self.id
    }

    fn generate_next_time(&mut self, _current_time: f64) -> Option<f64> {
        if self.limit.is_some_and(|limit| self.emitted >= limit) {
            return None;
        }

        let time = self.start + self.emitted as f64 * self.interval;
        match self.end {
            Some(end) if time > end => None,
            _ => Some(time),
        }
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
        self.emitted += 1;
        Ok(NextEvent::Ready(event))
    }
}
