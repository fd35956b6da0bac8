//! Generator merging several streams into one

use super::{EventGenerator, NextEvent};
use crate::models::{EventError, Sequencer};

/// Merges child generators into a single stream with the same contract
///
/// The next event always comes from the child with the earliest next time;
/// on equal times the child registered first wins. Events keep the id of the
/// child that produced them as their source.
///
/// # Example
/// ```
/// use event_simulator_core_rs::generators::{CompositeGenerator, EventGenerator, FixedIntervalGenerator};
///
/// let mut merged = CompositeGenerator::merge(
///     "combined",
///     FixedIntervalGenerator::new("walk_in", "arrival", 2.0, 2.0),
///     FixedIntervalGenerator::new("phone", "arrival", 1.0, 2.0),
/// );
/// assert_eq!(merged.generate_next_time(0.0), Some(1.0));
/// ```
pub struct CompositeGenerator {
    id: String,
    children: Vec<Box<dyn EventGenerator>>,
}

impl CompositeGenerator {
    pub fn new(id: impl Into<String>, children: Vec<Box<dyn EventGenerator>>) -> Self {
        Self {
            id: id.into(),
            children,
        }
    }

    /// Merge two generators
    pub fn merge<A, B>(id: impl Into<String>, first: A, second: B) -> Self
    where
        A: EventGenerator + 'static,
        B: EventGenerator + 'static,
    {
        Self::new(id, vec![Box::new(first), Box::new(second)])
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Index and time of the child with the earliest next event
    fn earliest(&mut self, current_time: f64) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (index, child) in self.children.iter_mut().enumerate() {
            if let Some(time) = child.generate_next_time(current_time) {
                if best.map_or(true, |(_, best_time)| time.total_cmp(&best_time).is_lt()) {
                    best = Some((index, time));
                }
            }
        }
        best
    }
}

impl EventGenerator for CompositeGenerator {
    fn id(&self) -> &str {
        &self.id
    }

    fn generate_next_time(&mut self, current_time: f64) -> Option<f64> {
        self.earliest(current_time).map(|(_, time)| time)
    }

    fn generate(
        &mut self,
        current_time: f64,
        sequencer: &mut Sequencer,
    ) -> Result<NextEvent, EventError> {
        // A child may still announce a time and then report exhaustion; give
        // every child at most one such chance.
        for _ in 0..self.children.len() {
            let Some((index, _)) = self.earliest(current_time) else {
                break;
            };
            if let NextEvent::Ready(event) = self.children[index].generate(current_time, sequencer)? {
                return Ok(NextEvent::Ready(event));
            }
        }
        Ok(NextEvent::Exhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::{FixedIntervalGenerator, PoissonGenerator, ScheduledGenerator};

    fn drain(generator: &mut dyn EventGenerator, max: usize) -> Vec<(f64, String)> {
        let mut seq = Sequencer::new();
        let mut out = Vec::new();
        let mut now = 0.0;
        while out.len() < max {
            match generator.generate(now, &mut seq).unwrap() {
                NextEvent::Ready(event) => {
                    now = event.time();
                    out.push((now, event.source().unwrap_or_default().to_string()));
                }
                NextEvent::Exhausted => break,
            }
        }
        out
    }

    #[test]
    fn test_interleaves_children_by_time() {
        let mut merged = CompositeGenerator::merge(
            "both",
            FixedIntervalGenerator::new("odd", "tick", 1.0, 2.0),
            FixedIntervalGenerator::new("even", "tick", 2.0, 2.0),
        );
        let times: Vec<f64> = drain(&mut merged, 6).into_iter().map(|(t, _)| t).collect();
        assert_eq!(times, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_first_child_wins_ties_and_sources_are_kept() {
        let mut merged = CompositeGenerator::merge(
            "both",
            ScheduledGenerator::new("a", "x", vec![1.0]),
            ScheduledGenerator::new("b", "x", vec![1.0]),
        );
        let events = drain(&mut merged, 10);
        assert_eq!(
            events,
            vec![(1.0, "a".to_string()), (1.0, "b".to_string())]
        );
    }

    #[test]
    fn test_exhausts_when_all_children_do() {
        let mut merged = CompositeGenerator::merge(
            "both",
            FixedIntervalGenerator::new("a", "x", 0.0, 1.0).with_limit(2),
            ScheduledGenerator::new("b", "x", vec![0.5]),
        );
        assert_eq!(drain(&mut merged, 100).len(), 3);
        assert_eq!(merged.generate_next_time(10.0), None);
    }

    #[test]
    fn test_merged_poisson_streams_are_reproducible() {
        let build = || {
            CompositeGenerator::merge(
                "combined",
                PoissonGenerator::new("p1", "arrival", 1.0, 1),
                PoissonGenerator::new("p2", "arrival", 2.0, 2),
            )
        };
        let mut first = build();
        let mut second = build();
        assert_eq!(drain(&mut first, 50), drain(&mut second, 50));
    }

    #[test]
    fn test_empty_composite_is_exhausted() {
        let mut merged = CompositeGenerator::new("none", Vec::new());
        assert!(merged.is_empty());
        assert_eq!(merged.generate_next_time(0.0), None);
    }
}
