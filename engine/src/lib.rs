//! Event Simulator Core - Rust Engine
//!
//! Deterministic discrete-event simulation: generators produce timestamped
//! events, a timeline dispatches them in time order to handlers, handlers
//! spawn follow-up events and record statistics.
//!
//! # Architecture
//!
//! - **core**: Simulated clock
//! - **models**: Domain types (Event, Sequencer)
//! - **generators**: Lazy event streams (fixed interval, Poisson, scheduled, composite)
//! - **timeline**: Time-ordered merge of spawned events and generator candidates
//! - **handlers**: Handler lifecycle, combinators and the dispatcher
//! - **stats**: Named metrics with synchronous observers
//! - **orchestrator**: Configuration and the main run loop
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. Dispatched event times never decrease
//! 2. Equal times are ordered by construction sequence, never by arrival order
//! 3. All randomness is deterministic (seeded RNG per generator)
//! 4. A generator holds at most one undispatched candidate
//!
//! # Example
//!
//! ```
//! use event_simulator_core_rs::generators::{FixedIntervalGenerator, PoissonGenerator};
//! use event_simulator_core_rs::handlers::StatsCollectingHandler;
//! use event_simulator_core_rs::{SimulationConfig, Simulator};
//!
//! let config = SimulationConfig::new().with_horizon(50.0).with_max_events(10_000);
//! let mut sim = Simulator::new(config);
//! sim.add_generator(PoissonGenerator::new("arrivals", "arrival", 1.0, 42));
//! sim.add_generator(FixedIntervalGenerator::new("audit", "audit", 10.0, 10.0));
//! sim.register_handler(None, StatsCollectingHandler::new("collector"));
//!
//! let report = sim.run().unwrap();
//! assert!(report.is_completed());
//! assert_eq!(sim.stats().counter("audit"), 5);
//! ```

// Module declarations
pub mod core;
pub mod generators;
pub mod handlers;
pub mod models;
pub mod orchestrator;
pub mod rng;
pub mod stats;
pub mod timeline;

// Re-exports for convenience
pub use core::clock::SimClock;
pub use generators::{EventGenerator, NextEvent};
pub use handlers::{EventDispatcher, EventHandler, HandlerFault, Outcome, Propagation};
pub use models::{Event, EventError, Payload, Sequencer};
pub use orchestrator::{
    AbortReason, CompletionReason, ConfigError, RunOutcome, RunReport, RunState, SimulationConfig,
    SimulationError, Simulator,
};
pub use rng::RngManager;
pub use stats::{Stats, StatsError, StatsObserver};
pub use timeline::{TimeOrderViolation, Timeline};
