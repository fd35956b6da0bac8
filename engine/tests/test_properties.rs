//! Property tests for the run loop
//!
//! Monotone dispatch, exact event ceiling, horizon bound and deterministic
//! replay, over randomly shaped workloads.

use event_simulator_core_rs::generators::{
    FixedIntervalGenerator, PoissonGenerator, ScheduledGenerator,
};
use event_simulator_core_rs::handlers::{EventHandler, HandlerResult, Outcome};
use event_simulator_core_rs::{
    CompletionReason, Event, RunOutcome, SimulationConfig, Simulator, Stats, Timeline,
};
use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

type Seen = Rc<RefCell<Vec<(f64, u64)>>>;

/// Records `(time, sequence)` of every event; optionally spawns a follow-up
struct Recorder {
    seen: Seen,
    spawn_delay: Option<f64>,
}

impl EventHandler for Recorder {
    fn id(&self) -> &str {
        "recorder"
    }

    fn process_event(&mut self, event: &Event, timeline: &mut Timeline, _: &mut Stats) -> HandlerResult<Outcome> {
        self.seen.borrow_mut().push((event.time(), event.sequence()));
        match self.spawn_delay {
            Some(delay) if event.event_type() != "follow_up" => {
                let next = Event::builder(event.time() + delay, "follow_up").build(timeline.sequencer())?;
                Ok(Outcome::spawn(vec![next]))
            }
            _ => Ok(Outcome::none()),
        }
    }
}

#[derive(Debug, Clone)]
struct Workload {
    seed: u64,
    rate: f64,
    interval: f64,
    schedule: Vec<f64>,
    spawn_delay: Option<f64>,
}

fn workload() -> impl Strategy<Value = Workload> {
    (
        any::<u64>(),
        0.1f64..5.0,
        0.05f64..3.0,
        prop::collection::vec(0.0f64..50.0, 0..20),
        prop::option::of(0.0f64..4.0),
    )
        .prop_map(|(seed, rate, interval, schedule, spawn_delay)| Workload {
            seed,
            rate,
            interval,
            schedule,
            spawn_delay,
        })
}

fn build(workload: &Workload, config: SimulationConfig) -> (Simulator, Seen) {
    let seen = Seen::default();
    let mut sim = Simulator::new(config);
    sim.add_generator(PoissonGenerator::new("poisson", "arrival", workload.rate, workload.seed));
    sim.add_generator(FixedIntervalGenerator::new("fixed", "tick", 0.0, workload.interval));
    sim.add_generator(ScheduledGenerator::new("scheduled", "planned", workload.schedule.clone()));
    sim.register_handler(
        None,
        Recorder {
            seen: Rc::clone(&seen),
            spawn_delay: workload.spawn_delay,
        },
    );
    (sim, seen)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_dispatch_is_monotone_and_tie_broken_by_sequence(w in workload()) {
        let (mut sim, seen) = build(&w, SimulationConfig::new().with_horizon(40.0).with_max_events(2_000));
        sim.run().unwrap();

        let seen = seen.borrow();
        for pair in seen.windows(2) {
            let (t0, s0) = pair[0];
            let (t1, s1) = pair[1];
            prop_assert!(t0 <= t1, "time went backwards: {} then {}", t0, t1);
            if t0 == t1 {
                prop_assert!(s0 < s1, "tie at {} dispatched {} before {}", t0, s0, s1);
            }
        }
    }

    #[test]
    fn prop_event_ceiling_is_exact(w in workload(), max in 0u64..300) {
        // Fixed-interval stream never ends, so the ceiling is always reached
        let (mut sim, seen) = build(&w, SimulationConfig::new().with_max_events(max));
        let report = sim.run().unwrap();

        prop_assert_eq!(report.outcome, RunOutcome::Completed(CompletionReason::MaxEventsReached));
        prop_assert_eq!(report.processed_events, max);
        prop_assert_eq!(seen.borrow().len() as u64, max);
    }

    #[test]
    fn prop_nothing_dispatched_past_horizon(w in workload(), horizon in 0.0f64..30.0) {
        let (mut sim, seen) = build(&w, SimulationConfig::new().with_horizon(horizon).with_max_events(5_000));
        let report = sim.run().unwrap();

        prop_assert!(report.is_completed());
        prop_assert!(seen.borrow().iter().all(|&(time, _)| time <= horizon));
        prop_assert!(report.final_time <= horizon);
    }

    #[test]
    fn prop_identical_inputs_replay_identically(w in workload()) {
        let config = SimulationConfig::new().with_horizon(25.0).with_max_events(1_000).with_trace(true);
        let (mut first, seen_first) = build(&w, config.clone());
        let (mut second, seen_second) = build(&w, config);

        let report_first = first.run().unwrap();
        let report_second = second.run().unwrap();

        prop_assert_eq!(report_first.trace_fingerprint, report_second.trace_fingerprint);
        prop_assert_eq!(&*seen_first.borrow(), &*seen_second.borrow());
        prop_assert_eq!(first.stats().summary(), second.stats().summary());
    }
}
