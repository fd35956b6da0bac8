//! Event model
//!
//! An [`Event`] is an immutable, timestamped occurrence. Besides its time it
//! carries a type tag used for handler routing, the id of the generator or
//! handler that produced it, an opaque payload, and a sequence number.
//!
//! # Ordering
//!
//! Events are ordered by `(time, sequence)`. Sequence numbers come from a
//! [`Sequencer`] owned by the timeline and are handed out at construction, so
//! for identical inputs and seeds the tie-break between equal-time events is
//! identical too, no matter whether an event came from a generator or was
//! spawned by a handler.
//!
//! # Example
//!
//! ```rust
//! use event_simulator_core_rs::models::{Event, Sequencer};
//!
//! let mut seq = Sequencer::new();
//! let arrival = Event::builder(1.5, "arrival")
//!     .source("arrivals")
//!     .with("customer_id", "C-000150")
//!     .build(&mut seq)
//!     .unwrap();
//!
//! assert_eq!(arrival.time(), 1.5);
//! assert_eq!(arrival.sequence(), 0);
//! assert_eq!(arrival.payload_str("customer_id"), Some("C-000150"));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use thiserror::Error;

/// Opaque event payload
///
/// Keys iterate in sorted order, which keeps serialized events (and trace
/// fingerprints) stable across runs.
pub type Payload = BTreeMap<String, Value>;

/// Errors raised while constructing an event
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EventError {
    #[error("Event time must be finite and non-negative, got {time}")]
    InvalidTime { time: f64 },

    #[error("Event type must not be empty")]
    EmptyEventType,
}

/// Allocator of event sequence numbers
///
/// Numbers start at zero and are never reused.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequencer {
    next: u64,
}

impl Sequencer {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Create a sequencer whose first number is `start`
    pub fn starting_at(start: u64) -> Self {
        Self { next: start }
    }

    /// Hand out the next sequence number
    pub fn next_sequence(&mut self) -> u64 {
        let sequence = self.next;
        self.next += 1;
        sequence
    }

    /// Number the next event will receive
    pub fn peek(&self) -> u64 {
        self.next
    }
}

/// A scheduled simulation event
///
/// Events are only created through [`EventBuilder::build`], which validates
/// them and hands out their sequence number. They serialize for traces and
/// exports but cannot be deserialized:
///
/// ```compile_fail
/// use event_simulator_core_rs::Event;
///
/// let forged: Event = serde_json::from_str(
///     r#"{"time":-3.0,"event_type":"","source":null,"payload":{},"sequence":0}"#,
/// ).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// Simulated time at which the event fires
    time: f64,

    /// Type tag used for handler routing
    event_type: String,

    /// Id of the generator or handler that produced the event
    source: Option<String>,

    /// Arbitrary key-value data
    payload: Payload,

    /// Construction-order tie-breaker
    sequence: u64,
}

impl Event {
    /// Start building an event at `time` with the given type
    pub fn builder(time: f64, event_type: impl Into<String>) -> EventBuilder {
        EventBuilder {
            time,
            event_type: event_type.into(),
            source: None,
            payload: Payload::new(),
        }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Look up a payload field
    pub fn payload_value(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// Look up a numeric payload field
    pub fn payload_f64(&self, key: &str) -> Option<f64> {
        self.payload.get(key).and_then(Value::as_f64)
    }

    /// Look up a string payload field
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    /// Compare two events by `(time, sequence)`
    ///
    /// This is the dispatch order: the smaller event fires first.
    pub fn schedule_cmp(&self, other: &Event) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then_with(|| self.sequence.cmp(&other.sequence))
    }

    /// Copy this event to a new time
    ///
    /// The copy keeps type, source and payload and receives a fresh sequence
    /// number, so it is ordered as a newly constructed event.
    pub fn rescheduled(&self, time: f64, sequencer: &mut Sequencer) -> Result<Event, EventError> {
        EventBuilder {
            time,
            event_type: self.event_type.clone(),
            source: self.source.clone(),
            payload: self.payload.clone(),
        }
        .build(sequencer)
    }
}

/// Builder for [`Event`]
///
/// Validation happens in [`EventBuilder::build`], before a sequence number is
/// allocated, so rejected events never consume one.
#[derive(Debug, Clone)]
#[must_use = "an event builder does nothing until built"]
pub struct EventBuilder {
    time: f64,
    event_type: String,
    source: Option<String>,
    payload: Payload,
}

impl EventBuilder {
    /// Set the originating generator or handler id
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Replace the whole payload
    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Add one payload field
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// Validate and construct the event
    ///
    /// # Errors
    /// * `EventError::InvalidTime` - time is negative, NaN or infinite
    /// * `EventError::EmptyEventType` - event type is an empty string
    pub fn build(self, sequencer: &mut Sequencer) -> Result<Event, EventError> {
        if !self.time.is_finite() || self.time < 0.0 {
            return Err(EventError::InvalidTime { time: self.time });
        }
        if self.event_type.is_empty() {
            return Err(EventError::EmptyEventType);
        }

        Ok(Event {
            time: self.time,
            event_type: self.event_type,
            source: self.source,
            payload: self.payload,
            sequence: sequencer.next_sequence(),
        })
    }
}
