//! Timeline - the time-ordered merge point of all event sources
//!
//! The timeline holds two kinds of pending events:
//!
//! - **materialized** events spawned by handlers (or scheduled up front),
//!   kept in a min-heap keyed by `(time, sequence)`;
//! - the single **candidate** of every active generator, kept in the
//!   generator's [`GeneratorSlot`].
//!
//! [`Timeline::pop_next`] returns the smallest `(time, sequence)` across both.
//! Because sequence numbers are assigned at construction by the timeline's own
//! [`Sequencer`], equal-time ties resolve identically on every replay, no
//! matter which kind of source an event came from.
//!
//! # Monotonicity
//!
//! The timeline never yields an event earlier than the previously yielded one.
//! `push` refuses events behind the clock with a [`TimeOrderViolation`]
//! instead of silently reordering them.

use crate::core::clock::SimClock;
use crate::generators::GeneratorSlot;
use crate::models::{Event, Sequencer};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use thiserror::Error;

/// An event scheduled earlier than the current simulated time
#[derive(Debug, Error, Clone, PartialEq)]
#[error(
    "Event '{}' (sequence {}) at time {} precedes current time {}",
    .event.event_type(),
    .event.sequence(),
    .event.time(),
    .current_time
)]
pub struct TimeOrderViolation {
    /// The offending event
    pub event: Event,
    /// Clock time when it was rejected
    pub current_time: f64,
}

/// Heap entry; reversed ordering turns `BinaryHeap` into a min-heap
#[derive(Debug, Clone)]
struct Pending(Event);

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.schedule_cmp(&self.0)
    }
}

/// Where the next event will come from
enum Source {
    Materialized,
    Generator(usize),
}

/// Time-ordered merge of spawned events and generator candidates
///
/// # Example
/// ```
/// use event_simulator_core_rs::models::Event;
/// use event_simulator_core_rs::Timeline;
///
/// let mut timeline = Timeline::new(0.0);
/// let late = Event::builder(5.0, "late").build(timeline.sequencer()).unwrap();
/// let early = Event::builder(1.0, "early").build(timeline.sequencer()).unwrap();
/// timeline.push(late).unwrap();
/// timeline.push(early).unwrap();
///
/// let next = timeline.pop_next(&mut []).unwrap();
/// assert_eq!(next.event_type(), "early");
/// assert_eq!(timeline.current_time(), 1.0);
/// ```
#[derive(Debug)]
pub struct Timeline {
    queue: BinaryHeap<Pending>,
    clock: SimClock,
    sequencer: Sequencer,
    popped: u64,
    discarded: u64,
}

impl Timeline {
    /// Create an empty timeline whose clock starts at `start_time`
    pub fn new(start_time: f64) -> Self {
        Self {
            queue: BinaryHeap::new(),
            clock: SimClock::new(start_time),
            sequencer: Sequencer::new(),
            popped: 0,
            discarded: 0,
        }
    }

    /// Time of the most recently popped event (start time before the first)
    pub fn current_time(&self) -> f64 {
        self.clock.now()
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Sequence allocator for events created during this simulation
    pub fn sequencer(&mut self) -> &mut Sequencer {
        &mut self.sequencer
    }

    /// Insert a materialized event
    ///
    /// # Errors
    /// `TimeOrderViolation` when the event is earlier than the current time.
    /// Events at exactly the current time are accepted.
    pub fn push(&mut self, event: Event) -> Result<(), TimeOrderViolation> {
        if !self.clock.admits(event.time()) {
            return Err(TimeOrderViolation {
                event,
                current_time: self.clock.now(),
            });
        }
        self.queue.push(Pending(event));
        Ok(())
    }

    /// Insert several events, stopping at the first violation
    pub fn push_all(
        &mut self,
        events: impl IntoIterator<Item = Event>,
    ) -> Result<(), TimeOrderViolation> {
        for event in events {
            self.push(event)?;
        }
        Ok(())
    }

    /// Earliest pending event across the heap and the generator candidates
    fn select<'a>(&'a self, generators: &'a [GeneratorSlot]) -> Option<(Source, &'a Event)> {
        let mut best: Option<(Source, &Event)> = self
            .queue
            .peek()
            .map(|pending| (Source::Materialized, &pending.0));

        for (index, slot) in generators.iter().enumerate() {
            if let Some(candidate) = slot.candidate() {
                let better = match &best {
                    Some((_, current)) => candidate.schedule_cmp(current).is_lt(),
                    None => true,
                };
                if better {
                    best = Some((Source::Generator(index), candidate));
                }
            }
        }
        best
    }

    /// The event `pop_next` would return, without removing it
    pub fn peek_next<'a>(&'a self, generators: &'a [GeneratorSlot]) -> Option<&'a Event> {
        self.select(generators).map(|(_, event)| event)
    }

    /// Remove and return the earliest pending event
    ///
    /// Considers every materialized event and the pending candidate of each
    /// generator slot. A candidate that wins is taken out of its slot, leaving
    /// the slot ready to be primed again. Returns `None` when nothing is
    /// pending anywhere.
    pub fn pop_next(&mut self, generators: &mut [GeneratorSlot]) -> Option<Event> {
        let source = self.select(generators).map(|(source, _)| source)?;

        let event = match source {
            Source::Materialized => self.queue.pop().map(|pending| pending.0),
            Source::Generator(index) => generators[index].take_candidate(),
        }?;

        let advanced = self.clock.advance_to(event.time());
        debug_assert!(
            advanced.is_ok(),
            "pending event at {} behind clock {}",
            event.time(),
            self.clock.now()
        );
        self.popped += 1;
        Some(event)
    }

    /// Time of the earliest materialized event
    pub fn peek_next_time(&self) -> Option<f64> {
        self.queue.peek().map(|pending| pending.0.time())
    }

    /// Number of materialized events
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of events popped so far
    pub fn popped(&self) -> u64 {
        self.popped
    }

    /// Drop every materialized event
    ///
    /// The clock and the sequencer are kept: time does not go backwards and
    /// sequence numbers are never reused.
    pub fn clear(&mut self) {
        self.discarded += self.queue.len() as u64;
        self.queue.clear();
    }

    /// Events taken off the timeline so far, popped or cleared
    ///
    /// Handlers only add events; the dispatcher compares this count around
    /// each handler call.
    pub fn removals(&self) -> u64 {
        self.popped + self.discarded
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(0.0)
    }
}
