//! Simulated clock
//!
//! The simulation operates in continuous time. The clock only moves forward:
//! every dispatched event advances it to the event's time, and an attempt to
//! move it backwards is reported instead of applied.

use serde::{Deserialize, Serialize};

/// Monotone simulated clock
///
/// # Example
/// ```
/// use event_simulator_core_rs::SimClock;
///
/// let mut clock = SimClock::new(0.0);
/// assert_eq!(clock.now(), 0.0);
///
/// clock.advance_to(2.5).unwrap();
/// assert_eq!(clock.now(), 2.5);
/// assert!(clock.advance_to(1.0).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimClock {
    /// Time the clock was created at
    start: f64,
    /// Time of the most recently dispatched event (or `start`)
    now: f64,
}

impl SimClock {
    /// Create a new clock positioned at `start`
    ///
    /// # Example
    /// ```
    /// use event_simulator_core_rs::SimClock;
    ///
    /// let clock = SimClock::new(10.0);
    /// assert_eq!(clock.start(), 10.0);
    /// assert_eq!(clock.now(), 10.0);
    /// ```
    pub fn new(start: f64) -> Self {
        Self { start, now: start }
    }

    /// Current simulated time
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Time the clock started at
    pub fn start(&self) -> f64 {
        self.start
    }

    /// Elapsed simulated time since start
    ///
    /// # Example
    /// ```
    /// use event_simulator_core_rs::SimClock;
    ///
    /// let mut clock = SimClock::new(1.0);
    /// clock.advance_to(4.0).unwrap();
    /// assert_eq!(clock.elapsed(), 3.0);
    /// ```
    pub fn elapsed(&self) -> f64 {
        self.now - self.start
    }

    /// Whether `time` can be reached without going backwards
    pub fn admits(&self, time: f64) -> bool {
        time >= self.now
    }

    /// Move the clock to `time`
    ///
    /// Staying at the same instant is allowed. On a backwards move the clock is
    /// left untouched and the current time is returned as the error.
    pub fn advance_to(&mut self, time: f64) -> Result<(), f64> {
        if !self.admits(time) {
            return Err(self.now);
        }
        self.now = time;
        Ok(())
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(0.0)
    }
}
