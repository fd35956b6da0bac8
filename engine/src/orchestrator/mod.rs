//! Orchestrator - configuration, run loop and dispatch trace
//!
//! See `engine.rs` for the run loop itself.

pub mod config;
pub mod engine;
pub mod trace;

pub use config::{ConfigError, SimulationConfig};
pub use engine::{
    AbortReason, CompletionReason, RunOutcome, RunReport, RunState, SimulationError, Simulator,
    StopCondition, FINAL_TIME_GAUGE, PROCESSED_EVENTS_GAUGE,
};
pub use trace::{DispatchTrace, TraceEntry};
