//! Generator replaying an explicit schedule

use super::{build_generated, EventGenerator, NextEvent, PayloadFactory};
use crate::models::{EventError, Payload, Sequencer};

/// Emits one event at each time of a predefined schedule
///
/// The schedule is sorted on construction. Times already behind the
/// simulation clock when the generator is queried are skipped.
pub struct ScheduledGenerator {
    id: String,
    event_type: String,
    schedule: Vec<f64>,
    index: usize,
    payload_factory: Option<PayloadFactory>,
}

impl ScheduledGenerator {
    pub fn new(id: impl Into<String>, event_type: impl Into<String>, mut schedule: Vec<f64>) -> Self {
        schedule.sort_by(f64::total_cmp);
        Self {
            id: id.into(),
            event_type: event_type.into(),
            schedule,
            index: 0,
            payload_factory: None,
        }
    }

    /// Attach a payload to every generated event
    pub fn with_payload(mut self, factory: impl Fn(f64) -> Payload + 'static) -> Self {
        self.payload_factory = Some(Box::new(factory));
        self
    }

    /// Number of scheduled times not yet emitted or skipped
    pub fn remaining(&self) -> usize {
        self.schedule.len() - self.index
    }
}

impl EventGenerator for ScheduledGenerator {
    fn id(&self) -> &str {
        &self.id
    }

    fn generate_next_time(&mut self, current_time: f64) -> Option<f64> {
        while let Some(&time) = self.schedule.get(self.index) {
            if time >= current_time {
                return Some(time);
            }
            self.index += 1;
        }
        None
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
        self.index += 1;
        Ok(NextEvent::Ready(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_is_sorted() {
        let mut seq = Sequencer::new();
        let mut generator = ScheduledGenerator::new("s", "x", vec![3.0, 1.0, 2.0]);
        let mut times = Vec::new();
        while let NextEvent::Ready(event) = generator.generate(0.0, &mut seq).unwrap() {
            times.push(event.time());
        }
        assert_eq!(times, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_past_times_are_skipped() {
        let mut generator = ScheduledGenerator::new("s", "x", vec![0.5, 1.0, 4.0]);
        assert_eq!(generator.generate_next_time(1.0), Some(1.0));
        assert_eq!(generator.generate_next_time(2.0), Some(4.0));
        assert_eq!(generator.remaining(), 1);
    }

    #[test]
    fn test_duplicate_times_each_emit() {
        let mut seq = Sequencer::new();
        let mut generator = ScheduledGenerator::new("s", "x", vec![2.0, 2.0]);
        assert!(matches!(generator.generate(0.0, &mut seq), Ok(NextEvent::Ready(_))));
        assert!(matches!(generator.generate(2.0, &mut seq), Ok(NextEvent::Ready(_))));
        assert!(matches!(generator.generate(2.0, &mut seq), Ok(NextEvent::Exhausted)));
    }
}
