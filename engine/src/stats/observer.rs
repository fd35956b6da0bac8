//! Stats observers
//!
//! Observers are notified synchronously on every metric mutation, in
//! registration order. Plain closures taking a [`MetricUpdate`] are observers.

use super::MetricKind;
use std::collections::BTreeSet;
use tracing::info;

/// Handle returned on registration, used to unregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(pub(crate) u64);

/// The value carried by a metric update
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateValue {
    /// New counter value
    Count(u64),
    /// Sample added to an aggregate
    Sample(f64),
    /// Point appended to a time series
    Point { time: f64, value: f64 },
    /// New gauge value
    Gauge(f64),
}

impl UpdateValue {
    /// Numeric view of the update (the value part for series points)
    pub fn as_f64(&self) -> f64 {
        match *self {
            UpdateValue::Count(count) => count as f64,
            UpdateValue::Sample(value) | UpdateValue::Gauge(value) => value,
            UpdateValue::Point { value, .. } => value,
        }
    }
}

/// A single metric mutation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricUpdate<'a> {
    pub name: &'a str,
    pub kind: MetricKind,
    pub value: UpdateValue,
}

/// Receives metric updates
pub trait StatsObserver {
    fn on_update(&mut self, update: &MetricUpdate<'_>);

    /// Called after the registry was reset; filters do not apply
    fn on_reset(&mut self) {}
}

impl<F> StatsObserver for F
where
    F: FnMut(&MetricUpdate<'_>),
{
    fn on_update(&mut self, update: &MetricUpdate<'_>) {
        self(update)
    }
}

/// Restricts which updates reach an observer
///
/// An empty name or kind set means "no restriction" on that axis; both axes
/// must accept an update for it to be delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObserverFilter {
    names: BTreeSet<String>,
    kinds: BTreeSet<MetricKind>,
}

impl ObserverFilter {
    /// Accept every update
    pub fn all() -> Self {
        Self::default()
    }

    /// Only updates to the given metric names
    pub fn names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Only updates of the given metric kinds
    pub fn kinds(mut self, kinds: impl IntoIterator<Item = MetricKind>) -> Self {
        self.kinds.extend(kinds);
        self
    }

    pub fn accepts(&self, update: &MetricUpdate<'_>) -> bool {
        (self.names.is_empty() || self.names.contains(update.name))
            && (self.kinds.is_empty() || self.kinds.contains(&update.kind))
    }
}

/// Observer that logs every update through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingStatsObserver;

impl StatsObserver for TracingStatsObserver {
    fn on_update(&mut self, update: &MetricUpdate<'_>) {
        info!(
            metric = update.name,
            kind = ?update.kind,
            value = update.value.as_f64(),
            "Stats updated"
        );
    }

    fn on_reset(&mut self) {
        info!("Stats reset");
    }
}
