//! Statistics registry
//!
//! [`Stats`] maps metric names to one of four kinds of metric:
//!
//! - **Counter**: monotonically increasing count
//! - **Aggregate**: running numeric aggregate (count/sum/min/max/mean), with
//!   samples kept for median and standard deviation
//! - **TimeSeries**: `(time, value)` samples in insertion order
//! - **Gauge**: last written value
//!
//! A name holds exactly one kind; writing to it as another kind is an error.
//!
//! Every mutation synchronously notifies the registered observers, in
//! registration order, before the mutating call returns (see [`observer`]).
//!
//! # Example
//!
//! ```
//! use event_simulator_core_rs::Stats;
//!
//! let mut stats = Stats::new();
//! stats.increment("arrivals").unwrap();
//! stats.record("wait_time", 2.0).unwrap();
//! stats.record("wait_time", 4.0).unwrap();
//!
//! assert_eq!(stats.counter("arrivals"), 1);
//! assert_eq!(stats.aggregate("wait_time").unwrap().mean(), Some(3.0));
//! assert!(stats.record("arrivals", 1.0).is_err());
//! ```

pub mod observer;

pub use observer::{
    MetricUpdate, ObserverFilter, ObserverId, StatsObserver, TracingStatsObserver, UpdateValue,
};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// The kind of a metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Counter,
    Aggregate,
    TimeSeries,
    Gauge,
}

/// Errors raised by metric mutations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatsError {
    #[error("Metric '{name}' is a {found:?}, cannot update it as a {expected:?}")]
    KindMismatch {
        name: String,
        expected: MetricKind,
        found: MetricKind,
    },
}

/// Running numeric aggregate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    count: u64,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
    samples: Vec<f64>,
}

impl Aggregate {
    fn record(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |min| min.min(value)));
        self.max = Some(self.max.map_or(value, |max| max.max(value)));
        self.samples.push(value);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn min(&self) -> Option<f64> {
        self.min
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    pub fn median(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let mut sorted = self.samples.clone();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            Some((sorted[mid - 1] + sorted[mid]) / 2.0)
        } else {
            Some(sorted[mid])
        }
    }

    /// Sample standard deviation; needs at least two samples
    pub fn std_dev(&self) -> Option<f64> {
        let mean = self.mean()?;
        if self.count < 2 {
            return None;
        }
        let squares: f64 = self.samples.iter().map(|x| (x - mean).powi(2)).sum();
        Some((squares / (self.count - 1) as f64).sqrt())
    }
}

/// A named metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Metric {
    Counter(u64),
    Aggregate(Aggregate),
    TimeSeries(Vec<(f64, f64)>),
    Gauge(f64),
}

impl Metric {
    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Counter(_) => MetricKind::Counter,
            Metric::Aggregate(_) => MetricKind::Aggregate,
            Metric::TimeSeries(_) => MetricKind::TimeSeries,
            Metric::Gauge(_) => MetricKind::Gauge,
        }
    }

    fn empty(kind: MetricKind) -> Self {
        match kind {
            MetricKind::Counter => Metric::Counter(0),
            MetricKind::Aggregate => Metric::Aggregate(Aggregate::default()),
            MetricKind::TimeSeries => Metric::TimeSeries(Vec::new()),
            MetricKind::Gauge => Metric::Gauge(0.0),
        }
    }
}

/// Read model of an aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub count: u64,
    pub sum: f64,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub median: Option<f64>,
    pub std_dev: Option<f64>,
}

impl From<&Aggregate> for AggregateSummary {
    fn from(aggregate: &Aggregate) -> Self {
        AggregateSummary {
            count: aggregate.count(),
            sum: aggregate.sum(),
            mean: aggregate.mean(),
            min: aggregate.min(),
            max: aggregate.max(),
            median: aggregate.median(),
            std_dev: aggregate.std_dev(),
        }
    }
}

/// Snapshot of every metric, grouped by kind
///
/// This is what an exporter consumes after (or during) a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub counters: BTreeMap<String, u64>,
    pub aggregates: BTreeMap<String, AggregateSummary>,
    pub time_series: BTreeMap<String, Vec<(f64, f64)>>,
    pub gauges: BTreeMap<String, f64>,
}

struct Registered {
    id: ObserverId,
    filter: ObserverFilter,
    observer: Box<dyn StatsObserver>,
}

/// Registry of named metrics with synchronous observers
#[derive(Default)]
pub struct Stats {
    metrics: BTreeMap<String, Metric>,
    observers: Vec<Registered>,
    next_observer_id: u64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Add one to a counter, returning the new count
    pub fn increment(&mut self, name: &str) -> Result<u64, StatsError> {
        self.increment_by(name, 1)
    }

    /// Add `by` to a counter, returning the new count
    pub fn increment_by(&mut self, name: &str, by: u64) -> Result<u64, StatsError> {
        let count = match self.entry(name, MetricKind::Counter)? {
            Metric::Counter(count) => {
                *count += by;
                *count
            }
            _ => unreachable!("entry() checked the kind"),
        };
        self.notify(name, MetricKind::Counter, UpdateValue::Count(count));
        Ok(count)
    }

    /// Add a sample to an aggregate
    pub fn record(&mut self, name: &str, value: f64) -> Result<(), StatsError> {
        match self.entry(name, MetricKind::Aggregate)? {
            Metric::Aggregate(aggregate) => aggregate.record(value),
            _ => unreachable!("entry() checked the kind"),
        }
        self.notify(name, MetricKind::Aggregate, UpdateValue::Sample(value));
        Ok(())
    }

    /// Append a `(time, value)` point to a time series
    pub fn record_point(&mut self, name: &str, time: f64, value: f64) -> Result<(), StatsError> {
        match self.entry(name, MetricKind::TimeSeries)? {
            Metric::TimeSeries(points) => points.push((time, value)),
            _ => unreachable!("entry() checked the kind"),
        }
        self.notify(name, MetricKind::TimeSeries, UpdateValue::Point { time, value });
        Ok(())
    }

    /// Overwrite a gauge
    pub fn set_gauge(&mut self, name: &str, value: f64) -> Result<(), StatsError> {
        match self.entry(name, MetricKind::Gauge)? {
            Metric::Gauge(current) => *current = value,
            _ => unreachable!("entry() checked the kind"),
        }
        self.notify(name, MetricKind::Gauge, UpdateValue::Gauge(value));
        Ok(())
    }

    /// Remove every metric; observers stay registered and are told
    pub fn reset(&mut self) {
        self.metrics.clear();
        for registered in &mut self.observers {
            registered.observer.on_reset();
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Counter value; zero when the counter does not exist
    pub fn counter(&self, name: &str) -> u64 {
        match self.metrics.get(name) {
            Some(Metric::Counter(count)) => *count,
            _ => 0,
        }
    }

    pub fn aggregate(&self, name: &str) -> Option<&Aggregate> {
        match self.metrics.get(name) {
            Some(Metric::Aggregate(aggregate)) => Some(aggregate),
            _ => None,
        }
    }

    /// Time series points; empty when the series does not exist
    pub fn series(&self, name: &str) -> &[(f64, f64)] {
        match self.metrics.get(name) {
            Some(Metric::TimeSeries(points)) => points,
            _ => &[],
        }
    }

    pub fn gauge(&self, name: &str) -> Option<f64> {
        match self.metrics.get(name) {
            Some(Metric::Gauge(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.metrics.get(name)
    }

    /// All metrics in name order
    pub fn metrics(&self) -> impl Iterator<Item = (&str, &Metric)> {
        self.metrics.iter().map(|(name, metric)| (name.as_str(), metric))
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Snapshot of every metric grouped by kind
    pub fn summary(&self) -> StatsSummary {
        let mut summary = StatsSummary::default();
        for (name, metric) in &self.metrics {
            match metric {
                Metric::Counter(count) => {
                    summary.counters.insert(name.clone(), *count);
                }
                Metric::Aggregate(aggregate) => {
                    summary.aggregates.insert(name.clone(), aggregate.into());
                }
                Metric::TimeSeries(points) => {
                    summary.time_series.insert(name.clone(), points.clone());
                }
                Metric::Gauge(value) => {
                    summary.gauges.insert(name.clone(), *value);
                }
            }
        }
        summary
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    /// Register an observer for every update
    pub fn add_observer(&mut self, observer: impl StatsObserver + 'static) -> ObserverId {
        self.add_filtered_observer(ObserverFilter::all(), observer)
    }

    /// Register an observer for the updates accepted by `filter`
    pub fn add_filtered_observer(
        &mut self,
        filter: ObserverFilter,
        observer: impl StatsObserver + 'static,
    ) -> ObserverId {
        let id = ObserverId(self.next_observer_id);
        self.next_observer_id += 1;
        self.observers.push(Registered {
            id,
            filter,
            observer: Box::new(observer),
        });
        id
    }

    /// Unregister an observer; returns false if it was not registered
    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|registered| registered.id != id);
        self.observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    fn entry(&mut self, name: &str, kind: MetricKind) -> Result<&mut Metric, StatsError> {
        let metric = self
            .metrics
            .entry(name.to_string())
            .or_insert_with(|| Metric::empty(kind));
        if metric.kind() != kind {
            return Err(StatsError::KindMismatch {
                name: name.to_string(),
                expected: kind,
                found: metric.kind(),
            });
        }
        Ok(metric)
    }

    fn notify(&mut self, name: &str, kind: MetricKind, value: UpdateValue) {
        let update = MetricUpdate { name, kind, value };
        for registered in &mut self.observers {
            if registered.filter.accepts(&update) {
                registered.observer.on_update(&update);
            }
        }
    }
}

impl std::fmt::Debug for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stats")
            .field("metrics", &self.metrics)
            .field("observers", &self.observers.len())
            .finish()
    }
}
