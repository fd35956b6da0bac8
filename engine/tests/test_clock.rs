//! Tests for SimClock

use event_simulator_core_rs::SimClock;

#[test]
fn test_clock_new() {
    let clock = SimClock::new(0.0);
    assert_eq!(clock.now(), 0.0);
    assert_eq!(clock.start(), 0.0);
    assert_eq!(clock.elapsed(), 0.0);
}

#[test]
fn test_clock_default_starts_at_zero() {
    assert_eq!(SimClock::default(), SimClock::new(0.0));
}

#[test]
fn test_advance_forward() {
    let mut clock = SimClock::new(0.0);

    clock.advance_to(1.5).unwrap();
    assert_eq!(clock.now(), 1.5);

    clock.advance_to(1.5).unwrap();
    assert_eq!(clock.now(), 1.5);

    clock.advance_to(10.0).unwrap();
    assert_eq!(clock.now(), 10.0);
    assert_eq!(clock.elapsed(), 10.0);
}

#[test]
fn test_advance_backwards_is_refused() {
    let mut clock = SimClock::new(0.0);
    clock.advance_to(7.0).unwrap();

    // Error carries the time the clock stayed at
    assert_eq!(clock.advance_to(6.0), Err(7.0));
    assert_eq!(clock.now(), 7.0);
}

#[test]
fn test_admits() {
    let mut clock = SimClock::new(2.0);
    assert!(!clock.admits(1.999));
    assert!(clock.admits(2.0));

    clock.advance_to(5.0).unwrap();
    assert!(!clock.admits(4.0));
    assert!(clock.admits(5.0));
    assert!(clock.admits(100.0));
}

#[test]
fn test_elapsed_is_relative_to_start() {
    let mut clock = SimClock::new(100.0);
    clock.advance_to(130.0).unwrap();
    assert_eq!(clock.elapsed(), 30.0);
}

#[test]
fn test_clock_serializes() {
    let mut clock = SimClock::new(1.0);
    clock.advance_to(2.0).unwrap();

    let json = serde_json::to_string(&clock).unwrap();
    let restored: SimClock = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, clock);
}
