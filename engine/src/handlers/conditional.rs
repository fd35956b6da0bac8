//! Handler branching on a predicate

use super::{EventHandler, HandlerResult, Outcome};
use crate::models::Event;
use crate::stats::Stats;
use crate::timeline::Timeline;

/// Delegates to one of two handlers depending on a predicate
///
/// When the predicate is false and no false branch is set, the event is
/// passed over with no effect. The chosen branch runs its full lifecycle and
/// its propagation decision is returned unchanged.
///
/// # Example
/// ```
/// use event_simulator_core_rs::handlers::{ConditionalHandler, StatsCollectingHandler};
///
/// let vip_only = ConditionalHandler::new(
///     "vip_only",
///     |event| event.payload_str("tier") == Some("vip"),
///     StatsCollectingHandler::new("vip_stats"),
/// );
/// ```
pub struct ConditionalHandler {
    id: String,
    predicate: Box<dyn Fn(&Event) -> bool>,
    on_true: Box<dyn EventHandler>,
    on_false: Option<Box<dyn EventHandler>>,
}

impl ConditionalHandler {
    pub fn new(
        id: impl Into<String>,
        predicate: impl Fn(&Event) -> bool + 'static,
        on_true: impl EventHandler + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            predicate: Box::new(predicate),
            on_true: Box::new(on_true),
            on_false: None,
        }
    }

    /// Handler used when the predicate is false
    pub fn otherwise(mut self, on_false: impl EventHandler + 'static) -> Self {
        self.on_false = Some(Box::new(on_false));
        self
    }
}

impl EventHandler for ConditionalHandler {
    fn id(&self) -> &str {
        &self.id
    }

    fn process_event(
        &mut self,
        event: &Event,
        timeline: &mut Timeline,
        stats: &mut Stats,
    ) -> HandlerResult<Outcome> {
        if (self.predicate)(event) {
            self.on_true.handle(event, timeline, stats)
        } else if let Some(on_false) = self.on_false.as_mut() {
            on_false.handle(event, timeline, stats)
        } else {
            Ok(Outcome::none())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::Witness;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn big(event: &Event) -> bool {
        event.payload_f64("size").is_some_and(|size| size > 10.0)
    }

    fn run(handler: &mut ConditionalHandler, size: f64) -> Outcome {
        let mut timeline = Timeline::new(0.0);
        let mut stats = Stats::new();
        let event = Event::builder(0.0, "job")
            .with("size", size)
            .build(timeline.sequencer())
            .unwrap();
        handler.handle(&event, &mut timeline, &mut stats).unwrap()
    }

    #[test]
    fn test_routes_by_predicate() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut handler = ConditionalHandler::new("route", big, Witness::new("big", &log))
            .otherwise(Witness::new("small", &log));

        run(&mut handler, 50.0);
        run(&mut handler, 1.0);

        let steps = log.borrow();
        assert!(steps.contains(&"big:process".to_string()));
        assert!(steps.contains(&"small:process".to_string()));
        assert_eq!(steps.len(), 6);
    }

    #[test]
    fn test_false_without_branch_is_a_no_op() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut handler = ConditionalHandler::new("route", big, Witness::new("big", &log));

        let outcome = run(&mut handler, 1.0);

        assert_eq!(outcome, Outcome::none());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_branch_stop_is_forwarded() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut handler = ConditionalHandler::new(
            "route",
            big,
            Witness::new("big", &log).with_outcome(|_, _| Ok(Outcome::none().stop())),
        );
        assert!(run(&mut handler, 50.0).stops());
    }
}
