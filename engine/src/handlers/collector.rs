//! Handler turning events into statistics

use super::{EventHandler, HandlerResult, Outcome};
use crate::models::Event;
use crate::stats::Stats;
use crate::timeline::Timeline;
use std::collections::BTreeSet;

/// Counts events by type and aggregates their numeric payload fields
///
/// For an event of type `T`, increments the counter `T` and records every
/// numeric payload field `f` into the aggregate `T.f`. Non-numeric fields are
/// ignored. Spawns nothing.
pub struct StatsCollectingHandler {
    id: String,
    event_types: BTreeSet<String>,
}

impl StatsCollectingHandler {
    /// Collect every event type
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            event_types: BTreeSet::new(),
        }
    }

    /// Collect only the given event types
    pub fn for_types<I, S>(id: impl Into<String>, event_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            event_types: event_types.into_iter().map(Into::into).collect(),
        }
    }
}

impl EventHandler for StatsCollectingHandler {
    fn id(&self) -> &str {
        &self.id
    }

    fn can_handle(&self, event: &Event) -> bool {
        self.event_types.is_empty() || self.event_types.contains(event.event_type())
    }

    fn process_event(
        &mut self,
        event: &Event,
        _timeline: &mut Timeline,
        stats: &mut Stats,
    ) -> HandlerResult<Outcome> {
        stats.increment(event.event_type())?;
        for (field, value) in event.payload() {
            if let Some(number) = value.as_f64() {
                stats.record(&format!("{}.{}", event.event_type(), field), number)?;
            }
        }
        Ok(Outcome::none())
    }
}
