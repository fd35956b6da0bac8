//! Handler logging every step of the lifecycle

use super::{EventHandler, HandlerResult, Outcome};
use crate::models::Event;
use crate::stats::Stats;
use crate::timeline::Timeline;
use tracing::info;

/// Where a [`LoggingEventHandler`] writes its lines
pub enum LogSink {
    /// `tracing` at info level, with the event as structured fields
    Tracing,
    /// A caller-supplied function receiving each formatted line
    Custom(Box<dyn FnMut(&str)>),
}

/// Logs the handling of each event and spawns nothing
///
/// Three lines per event: one before processing, one with the payload, one
/// after processing reporting how many events were spawned.
pub struct LoggingEventHandler {
    id: String,
    sink: LogSink,
}

impl LoggingEventHandler {
    /// Log through `tracing`
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sink: LogSink::Tracing,
        }
    }

    /// Log through a custom sink
    pub fn with_sink(id: impl Into<String>, sink: impl FnMut(&str) + 'static) -> Self {
        Self {
            id: id.into(),
            sink: LogSink::Custom(Box::new(sink)),
        }
    }

    fn emit(&mut self, event: &Event, message: &str) {
        match &mut self.sink {
            LogSink::Tracing => info!(
                handler = %self.id,
                event_type = event.event_type(),
                time = event.time(),
                sequence = event.sequence(),
                "{}",
                message
            ),
            LogSink::Custom(sink) => sink(&format!(
                "[{}] {} at {}: {}",
                self.id,
                event.event_type(),
                event.time(),
                message
            )),
        }
    }
}

impl EventHandler for LoggingEventHandler {
    fn id(&self) -> &str {
        &self.id
    }

    fn pre_handle(
        &mut self,
        event: &Event,
        _timeline: &mut Timeline,
        _stats: &mut Stats,
    ) -> HandlerResult<Vec<Event>> {
        self.emit(event, "handling event");
        Ok(Vec::new())
    }

    fn process_event(
        &mut self,
        event: &Event,
        _timeline: &mut Timeline,
        _stats: &mut Stats,
    ) -> HandlerResult<Outcome> {
        let payload = serde_json::to_string(event.payload())
            .unwrap_or_else(|_| format!("{:?}", event.payload()));
        self.emit(event, &format!("payload {}", payload));
        Ok(Outcome::none())
    }

    fn post_handle(
        &mut self,
        event: &Event,
        spawned: &[Event],
        _timeline: &mut Timeline,
        _stats: &mut Stats,
    ) -> HandlerResult<Vec<Event>> {
        let message = if spawned.is_empty() {
            "no events spawned".to_string()
        } else {
            format!("spawned {} events", spawned.len())
        };
        self.emit(event, &message);
        Ok(Vec::new())
    }
}
