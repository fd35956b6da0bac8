//! Domain models for the event simulator

pub mod event;

// Re-exports
pub use event::{Event, EventBuilder, EventError, Payload, Sequencer};
