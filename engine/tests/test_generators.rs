//! Tests for the built-in event generators and the generator slot

use event_simulator_core_rs::generators::{
    CompositeGenerator, EventGenerator, FixedIntervalGenerator, GeneratorSlot, NextEvent,
    PoissonGenerator, PrimeError, Retirement, ScheduledGenerator,
};
use event_simulator_core_rs::{Event, EventError, Payload, Sequencer};
use serde_json::json;

/// Pull events until exhaustion (or `max`), advancing `now` as the engine would
fn drain(generator: &mut dyn EventGenerator, max: usize) -> Vec<Event> {
    let mut seq = Sequencer::new();
    let mut now = 0.0;
    let mut events = Vec::new();
    while events.len() < max {
        match generator.generate(now, &mut seq).unwrap() {
            NextEvent::Ready(event) => {
                now = event.time();
                events.push(event);
            }
            NextEvent::Exhausted => break,
        }
    }
    events
}

fn times(events: &[Event]) -> Vec<f64> {
    events.iter().map(Event::time).collect()
}

// ============================================================================
// FixedIntervalGenerator
// ============================================================================

#[test]
fn test_fixed_interval_times() {
    let mut generator = FixedIntervalGenerator::new("clock", "tick", 0.5, 0.25).with_limit(4);
    assert_eq!(times(&drain(&mut generator, 100)), vec![0.5, 0.75, 1.0, 1.25]);
}

#[test]
fn test_fixed_interval_end_is_inclusive() {
    let mut generator = FixedIntervalGenerator::new("clock", "tick", 0.0, 1.0).until(3.0);
    assert_eq!(times(&drain(&mut generator, 100)), vec![0.0, 1.0, 2.0, 3.0]);
    assert_eq!(generator.generate_next_time(3.0), None);
}

#[test]
fn test_fixed_interval_has_no_drift() {
    let mut generator = FixedIntervalGenerator::new("clock", "tick", 0.0, 0.1);
    let events = drain(&mut generator, 1001);
    assert_eq!(events[1000].time(), 1000.0 * 0.1);
}

#[test]
fn test_generated_events_carry_source_and_type() {
    let mut generator = FixedIntervalGenerator::new("walk_in", "arrival", 1.0, 1.0).with_limit(1);
    let events = drain(&mut generator, 10);
    assert_eq!(events[0].source(), Some("walk_in"));
    assert_eq!(events[0].event_type(), "arrival");
}

#[test]
fn test_payload_factory_sees_event_time() {
    let mut generator = FixedIntervalGenerator::new("clock", "tick", 1.0, 1.0)
        .with_limit(2)
        .with_payload(|time| {
            let mut payload = Payload::new();
            payload.insert("hour".to_string(), json!(time * 60.0));
            payload
        });
    let events = drain(&mut generator, 10);
    assert_eq!(events[0].payload_f64("hour"), Some(60.0));
    assert_eq!(events[1].payload_f64("hour"), Some(120.0));
}

// ============================================================================
// PoissonGenerator
// ============================================================================

#[test]
fn test_poisson_reproducible_per_seed() {
    let mut a = PoissonGenerator::new("a", "arrival", 2.0, 2024).until(100.0);
    let mut b = PoissonGenerator::new("a", "arrival", 2.0, 2024).until(100.0);
    let a_events = drain(&mut a, usize::MAX);
    let b_events = drain(&mut b, usize::MAX);
    assert_eq!(a_events, b_events);
    assert!(!a_events.is_empty());
}

#[test]
fn test_poisson_repeated_peek_is_stable() {
    let mut generator = PoissonGenerator::new("p", "arrival", 1.0, 9);
    let first = generator.generate_next_time(0.0);
    for _ in 0..10 {
        assert_eq!(generator.generate_next_time(0.0), first);
    }
    let mut seq = Sequencer::new();
    match generator.generate(0.0, &mut seq).unwrap() {
        NextEvent::Ready(event) => assert_eq!(Some(event.time()), first),
        NextEvent::Exhausted => panic!("rate 1.0 stream ended"),
    }
}

#[test]
fn test_poisson_negative_rate_is_exhausted() {
    let mut generator = PoissonGenerator::new("p", "arrival", -1.0, 9);
    assert!(drain(&mut generator, 10).is_empty());
}

// ============================================================================
// ScheduledGenerator / CompositeGenerator
// ============================================================================

#[test]
fn test_scheduled_generator_emits_each_time_once() {
    let mut generator = ScheduledGenerator::new("s", "maintenance", vec![5.0, 1.0, 3.0]);
    assert_eq!(times(&drain(&mut generator, 10)), vec![1.0, 3.0, 5.0]);
    assert_eq!(generator.remaining(), 0);
}

#[test]
fn test_composite_odd_even_merge() {
    let mut merged = CompositeGenerator::merge(
        "numbers",
        FixedIntervalGenerator::new("odd", "n", 1.0, 2.0),
        FixedIntervalGenerator::new("even", "n", 2.0, 2.0),
    );
    let events = drain(&mut merged, 6);
    assert_eq!(times(&events), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let sources: Vec<&str> = events.iter().filter_map(Event::source).collect();
    assert_eq!(sources, vec!["odd", "even", "odd", "even", "odd", "even"]);
}

#[test]
fn test_composite_of_many() {
    let children: Vec<Box<dyn EventGenerator>> = vec![
        Box::new(ScheduledGenerator::new("a", "x", vec![3.0])),
        Box::new(ScheduledGenerator::new("b", "x", vec![1.0])),
        Box::new(ScheduledGenerator::new("c", "x", vec![2.0])),
    ];
    let mut merged = CompositeGenerator::new("abc", children);
    assert_eq!(merged.len(), 3);
    assert_eq!(times(&drain(&mut merged, 10)), vec![1.0, 2.0, 3.0]);
}

// ============================================================================
// GeneratorSlot
// ============================================================================

#[test]
fn test_slot_asks_for_one_candidate_at_a_time() {
    let mut seq = Sequencer::new();
    let mut slot = GeneratorSlot::new(Box::new(FixedIntervalGenerator::new("g", "tick", 0.0, 1.0)));

    slot.prime(0.0, None, &mut seq).unwrap();
    let first = slot.candidate().cloned().unwrap();

    // Priming again while the candidate is pending changes nothing
    slot.prime(0.0, None, &mut seq).unwrap();
    assert_eq!(slot.candidate(), Some(&first));
    assert_eq!(seq.peek(), 1);
}

#[test]
fn test_slot_retires_on_exhaustion() {
    let mut seq = Sequencer::new();
    let mut slot = GeneratorSlot::new(Box::new(ScheduledGenerator::new("g", "x", Vec::new())));

    assert_eq!(slot.prime(0.0, None, &mut seq).unwrap(), Some(Retirement::Exhausted));
    assert!(!slot.is_active());
    assert_eq!(slot.prime(0.0, None, &mut seq).unwrap(), None);
}

#[test]
fn test_slot_retires_beyond_horizon_without_consuming() {
    let mut seq = Sequencer::new();
    let mut slot = GeneratorSlot::new(Box::new(ScheduledGenerator::new("g", "x", vec![9.0])));

    let retirement = slot.prime(0.0, Some(5.0), &mut seq).unwrap();

    assert_eq!(retirement, Some(Retirement::BeyondHorizon { next_time: 9.0 }));
    assert!(slot.candidate().is_none());
    assert_eq!(seq.peek(), 0);
}

#[test]
fn test_slot_reports_invalid_generated_event() {
    let mut seq = Sequencer::new();
    let mut slot = GeneratorSlot::new(Box::new(FixedIntervalGenerator::new("bad", "x", -1.0, 1.0)));

    let err = slot.prime(-2.0, None, &mut seq).unwrap_err();

    assert_eq!(
        err,
        PrimeError::InvalidEvent {
            generator: "bad".to_string(),
            source: EventError::InvalidTime { time: -1.0 },
        }
    );
}

#[test]
fn test_slot_rejects_candidate_behind_clock() {
    struct Stale;

    impl EventGenerator for Stale {
        fn id(&self) -> &str {
            "stale"
        }

        fn generate_next_time(&mut self, _current_time: f64) -> Option<f64> {
            Some(1.0)
        }

        fn generate(&mut self, _current_time: f64, sequencer: &mut Sequencer) -> Result<NextEvent, EventError> {
            Event::builder(1.0, "stale").build(sequencer).map(NextEvent::Ready)
        }
    }

    let mut seq = Sequencer::new();
    let mut slot = GeneratorSlot::new(Box::new(Stale));
    let err = slot.prime(4.0, None, &mut seq).unwrap_err();
    assert!(matches!(err, PrimeError::TimeOrder(v) if v.current_time == 4.0));
}
