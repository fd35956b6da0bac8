//! Simulator - the run loop
//!
//! Each iteration of [`Simulator::run`]:
//!
//! 1. **Prime**: every active generator without a candidate is asked for one;
//!    generators that are exhausted or whose next time is past the horizon
//!    are retired
//! 2. **Select**: the earliest pending event across spawned events and
//!    generator candidates is taken from the timeline
//! 3. **Horizon**: an event past the horizon ends the run undispatched
//! 4. **Dispatch**: the event goes to its handlers; spawned events are
//!    pushed back onto the timeline
//! 5. **Count**: the processed counter advances; the stop condition is asked
//!
//! The run ends `Completed` when sources run dry, the horizon is reached, the
//! event ceiling is hit, or the stop condition fires. It ends `Aborted` on a
//! time-order violation, an invalid generated event, or a handler fault under
//! the abort policy.

use super::config::{ConfigError, SimulationConfig};
use super::trace::DispatchTrace;
use crate::generators::{EventGenerator, GeneratorSlot, PrimeError, Retirement};
use crate::handlers::{EventDispatcher, EventHandler, FaultRecord, HandlerFault};
use crate::models::{Event, EventError, Sequencer};
use crate::stats::{Stats, TracingStatsObserver};
use crate::timeline::{TimeOrderViolation, Timeline};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Gauge holding the number of dispatched events after a run
pub const PROCESSED_EVENTS_GAUGE: &str = "simulator.processed_events";

/// Gauge holding the time of the last dispatched event after a run
pub const FINAL_TIME_GAUGE: &str = "simulator.final_time";

/// Predicate consulted after every dispatched event
pub type StopCondition = Box<dyn FnMut(&Timeline, &Stats) -> bool>;

// ============================================================================
// Run State
// ============================================================================

/// Why a run completed normally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    /// No spawned events left and every generator exhausted
    SourcesExhausted,
    /// The next event lies past the horizon
    HorizonReached,
    /// The dispatch ceiling was hit
    MaxEventsReached,
    /// The stop condition returned true
    StopCondition,
}

/// Why a run was aborted
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AbortReason {
    #[error(transparent)]
    TimeOrderViolation(TimeOrderViolation),

    #[error("Generator '{generator}' built an invalid event: {source}")]
    InvalidEvent { generator: String, source: EventError },

    #[error(transparent)]
    HandlerFault(FaultRecord),
}

impl AbortReason {
    fn from_fault(record: FaultRecord) -> Self {
        match record.fault {
            HandlerFault::TimeOrder(violation) => AbortReason::TimeOrderViolation(violation),
            fault => AbortReason::HandlerFault(FaultRecord { fault, ..record }),
        }
    }
}

impl From<PrimeError> for AbortReason {
    fn from(err: PrimeError) -> Self {
        match err {
            PrimeError::InvalidEvent { generator, source } => {
                AbortReason::InvalidEvent { generator, source }
            }
            PrimeError::TimeOrder(violation) => AbortReason::TimeOrderViolation(violation),
        }
    }
}

/// Terminal result of a run
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(CompletionReason),
    Aborted(AbortReason),
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, RunOutcome::Aborted(_))
    }
}

/// Lifecycle state of a simulator
#[derive(Debug, Clone, PartialEq)]
pub enum RunState {
    Idle,
    Running,
    Completed(CompletionReason),
    Aborted(AbortReason),
}

impl From<RunOutcome> for RunState {
    fn from(outcome: RunOutcome) -> Self {
        match outcome {
            RunOutcome::Completed(reason) => RunState::Completed(reason),
            RunOutcome::Aborted(reason) => RunState::Aborted(reason),
        }
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Tags the run's log lines
    pub run_id: Uuid,
    pub outcome: RunOutcome,
    pub processed_events: u64,
    /// Time of the last dispatched event (start time if none)
    pub final_time: f64,
    pub faults: Vec<FaultRecord>,
    pub dispatch_counts: BTreeMap<String, u64>,
    /// Present when the run recorded a dispatch trace
    pub trace_fingerprint: Option<String>,
}

impl RunReport {
    pub fn is_completed(&self) -> bool {
        self.outcome.is_completed()
    }

    pub fn is_aborted(&self) -> bool {
        self.outcome.is_aborted()
    }
}

/// Simulator errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimulationError {
    #[error("Simulator has already run; build a new one to run again")]
    AlreadyRun,

    #[error(transparent)]
    TimeOrder(#[from] TimeOrderViolation),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ============================================================================
// Simulator
// ============================================================================

/// Owns generators, handlers, timeline and stats, and runs them once
///
/// # Example
///
/// ```rust
/// use event_simulator_core_rs::generators::FixedIntervalGenerator;
/// use event_simulator_core_rs::handlers::StatsCollectingHandler;
/// use event_simulator_core_rs::orchestrator::CompletionReason;
/// use event_simulator_core_rs::{RunOutcome, SimulationConfig, Simulator};
///
/// let mut sim = Simulator::new(SimulationConfig::new().with_horizon(2.5));
/// sim.add_generator(FixedIntervalGenerator::new("clock", "tick", 1.0, 1.0));
/// sim.register_handler("tick", StatsCollectingHandler::new("ticks"));
///
/// let report = sim.run().unwrap();
/// assert_eq!(report.outcome, RunOutcome::Completed(CompletionReason::HorizonReached));
/// assert_eq!(report.processed_events, 2);
/// assert_eq!(sim.stats().counter("tick"), 2);
/// ```
pub struct Simulator {
    config: SimulationConfig,
    generators: Vec<GeneratorSlot>,
    dispatcher: EventDispatcher,
    timeline: Timeline,
    stats: Stats,
    stop_condition: Option<StopCondition>,
    state: RunState,
    processed: u64,
    trace: Option<DispatchTrace>,
}

impl Simulator {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            timeline: Timeline::new(config.start_time),
            config,
            generators: Vec::new(),
            dispatcher: EventDispatcher::new(),
            stats: Stats::new(),
            stop_condition: None,
            state: RunState::Idle,
            processed: 0,
            trace: None,
        }
    }

    /// Build a simulator from a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, SimulationError> {
        Ok(Self::new(SimulationConfig::from_json(json)?))
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    pub fn add_generator(&mut self, generator: impl EventGenerator + 'static) {
        self.add_boxed_generator(Box::new(generator));
    }

    pub fn add_boxed_generator(&mut self, generator: Box<dyn EventGenerator>) {
        self.generators.push(GeneratorSlot::new(generator));
    }

    /// Register a handler for `event_type`, or for every event when `None`
    pub fn register_handler<'a>(
        &mut self,
        event_type: impl Into<Option<&'a str>>,
        handler: impl EventHandler + 'static,
    ) {
        self.dispatcher.register_handler(event_type, handler);
    }

    pub fn set_stop_condition(&mut self, condition: impl FnMut(&Timeline, &Stats) -> bool + 'static) {
        self.stop_condition = Some(Box::new(condition));
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.config.verbose = verbose;
    }

    /// Put an event on the timeline before the run
    ///
    /// Build it with [`Simulator::sequencer`] so its sequence number belongs
    /// to this simulation.
    pub fn schedule(&mut self, event: Event) -> Result<(), SimulationError> {
        if self.state != RunState::Idle {
            return Err(SimulationError::AlreadyRun);
        }
        self.timeline.push(event)?;
        Ok(())
    }

    pub fn sequencer(&mut self) -> &mut Sequencer {
        self.timeline.sequencer()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Mutable stats, e.g. for registering observers
    pub fn stats_mut(&mut self) -> &mut Stats {
        &mut self.stats
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    pub fn generators(&self) -> &[GeneratorSlot] {
        &self.generators
    }

    pub fn processed_events(&self) -> u64 {
        self.processed
    }

    pub fn current_time(&self) -> f64 {
        self.timeline.current_time()
    }

    /// Dispatch trace, when `record_trace` was set
    pub fn trace(&self) -> Option<&DispatchTrace> {
        self.trace.as_ref()
    }

    // ------------------------------------------------------------------
    // Run
    // ------------------------------------------------------------------

    /// Run the simulation to completion
    ///
    /// An aborted run is still `Ok`: the report carries the abort reason.
    ///
    /// # Errors
    /// `SimulationError::AlreadyRun` if this simulator has run before.
    pub fn run(&mut self) -> Result<RunReport, SimulationError> {
        if self.state != RunState::Idle {
            return Err(SimulationError::AlreadyRun);
        }
        self.state = RunState::Running;

        let run_id = Uuid::new_v4();
        self.dispatcher
            .set_abort_on_fault(self.config.abort_on_handler_fault);
        if self.config.verbose {
            self.stats.add_observer(TracingStatsObserver);
        }
        if self.config.record_trace {
            self.trace = Some(DispatchTrace::new());
        }

        let config_hash = match self.config.fingerprint() {
            Ok(hash) => hash,
            Err(e) => {
                warn!(%run_id, error = %e, "Could not fingerprint configuration");
                String::new()
            }
        };

        info!(
            %run_id,
            %config_hash,
            generators = self.generators.len(),
            handlers = self.dispatcher.handler_count(),
            start_time = self.config.start_time,
            horizon = ?self.config.horizon,
            max_events = ?self.config.max_events,
            "Simulation started"
        );

        let outcome = self.event_loop(run_id);
        let final_time = self.timeline.current_time();

        for (gauge, value) in [
            (PROCESSED_EVENTS_GAUGE, self.processed as f64),
            (FINAL_TIME_GAUGE, final_time),
        ] {
            if let Err(e) = self.stats.set_gauge(gauge, value) {
                warn!(%run_id, error = %e, "Could not record run gauge");
            }
        }

        match &outcome {
            RunOutcome::Completed(reason) => info!(
                %run_id,
                ?reason,
                processed_events = self.processed,
                final_time,
                faults = self.dispatcher.faults().len(),
                "Simulation completed"
            ),
            RunOutcome::Aborted(reason) => error!(
                %run_id,
                error = %reason,
                processed_events = self.processed,
                final_time,
                "Simulation aborted"
            ),
        }

        self.state = outcome.clone().into();

        Ok(RunReport {
            run_id,
            outcome,
            processed_events: self.processed,
            final_time,
            faults: self.dispatcher.faults().to_vec(),
            dispatch_counts: self.dispatcher.dispatch_counts().clone(),
            trace_fingerprint: self.trace.as_ref().map(DispatchTrace::fingerprint),
        })
    }

    fn event_loop(&mut self, run_id: Uuid) -> RunOutcome {
        let horizon = self.config.horizon;

        loop {
            if self
                .config
                .max_events
                .is_some_and(|max| self.processed >= max)
            {
                return RunOutcome::Completed(CompletionReason::MaxEventsReached);
            }

            // Prime
            let now = self.timeline.current_time();
            for slot in &mut self.generators {
                match slot.prime(now, horizon, self.timeline.sequencer()) {
                    Ok(Some(retirement)) => {
                        debug!(%run_id, generator = slot.id(), ?retirement, emitted = slot.emitted(), "Generator retired");
                    }
                    Ok(None) => {}
                    Err(e) => return RunOutcome::Aborted(e.into()),
                }
            }

            // Select
            let Some(next) = self.timeline.peek_next(&self.generators) else {
                return RunOutcome::Completed(self.drained_reason());
            };
            if horizon.is_some_and(|horizon| next.time() > horizon) {
                return RunOutcome::Completed(CompletionReason::HorizonReached);
            }
            let Some(event) = self.timeline.pop_next(&mut self.generators) else {
                return RunOutcome::Completed(self.drained_reason());
            };

            // Dispatch
            debug!(
                %run_id,
                time = event.time(),
                sequence = event.sequence(),
                event_type = event.event_type(),
                source = ?event.source(),
                "Dispatching event"
            );
            if let Some(trace) = self.trace.as_mut() {
                trace.record(&event);
            }
            let dispatched = self
                .dispatcher
                .dispatch(&event, &mut self.timeline, &mut self.stats);

            // Count
            self.processed += 1;

            match dispatched {
                Ok(spawned) => {
                    if let Err(violation) = self.timeline.push_all(spawned) {
                        return RunOutcome::Aborted(AbortReason::TimeOrderViolation(violation));
                    }
                }
                Err(record) => return RunOutcome::Aborted(AbortReason::from_fault(record)),
            }

            if let Some(condition) = self.stop_condition.as_mut() {
                if condition(&self.timeline, &self.stats) {
                    return RunOutcome::Completed(CompletionReason::StopCondition);
                }
            }
        }
    }

    /// Reason for a run that ran out of pending events
    fn drained_reason(&self) -> CompletionReason {
        let cut_by_horizon = self
            .generators
            .iter()
            .any(|slot| matches!(slot.retirement(), Some(Retirement::BeyondHorizon { .. })));
        if cut_by_horizon {
            CompletionReason::HorizonReached
        } else {
            CompletionReason::SourcesExhausted
        }
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("generators", &self.generators)
            .field("dispatcher", &self.dispatcher)
            .field("timeline", &self.timeline)
            .field("processed", &self.processed)
            .finish()
    }
}
