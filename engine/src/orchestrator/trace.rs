//! Dispatch trace
//!
//! Records which events were dispatched, in order, and condenses the record
//! into a SHA-256 fingerprint. Two runs with identical inputs and seeds have
//! identical fingerprints.

use crate::models::Event;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One dispatched event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub time: f64,
    pub sequence: u64,
    pub event_type: String,
    pub source: Option<String>,
}

impl From<&Event> for TraceEntry {
    fn from(event: &Event) -> Self {
        TraceEntry {
            time: event.time(),
            sequence: event.sequence(),
            event_type: event.event_type().to_string(),
            source: event.source().map(str::to_string),
        }
    }
}

/// Ordered record of dispatched events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchTrace {
    entries: Vec<TraceEntry>,
}

impl DispatchTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: &Event) {
        self.entries.push(event.into());
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dispatch times, in dispatch order
    pub fn times(&self) -> Vec<f64> {
        self.entries.iter().map(|entry| entry.time).collect()
    }

    /// Hex SHA-256 over every entry
    ///
    /// Times are hashed by bit pattern so that replays must match exactly.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for entry in &self.entries {
            hasher.update(entry.time.to_bits().to_le_bytes());
            hasher.update(entry.sequence.to_le_bytes());
            hasher.update(entry.event_type.as_bytes());
            hasher.update([0u8]);
            if let Some(source) = &entry.source {
                hasher.update(source.as_bytes());
            }
            hasher.update([0xffu8]);
        }
        format!("{:x}", hasher.finalize())
    }
}
