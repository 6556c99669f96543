//! Fan-out sink
//!
//! Dispatches every event to an ordered list of sinks. Each sink is
//! isolated: a panic inside one is caught and logged, and the remaining
//! sinks still receive the event.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use log::warn;

use super::event::GovernanceEvent;
use super::sink::EventSink;

/// Ordered set of sinks receiving the same events
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }

    /// Append a sink; dispatch follows insertion order
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl EventSink for FanoutSink {
    fn emit(&self, event: GovernanceEvent) {
        for sink in &self.sinks {
            let copy = event.clone();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| sink.emit(copy)));
            if outcome.is_err() {
                warn!(
                    "Sink '{}' panicked while emitting event for request {}",
                    sink.name(),
                    event.request_id
                );
            }
        }
    }

    fn name(&self) -> &str {
        "fanout"
    }
}

impl std::fmt::Debug for FanoutSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.sinks.iter().map(|s| s.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{PanickingSink, RecordingSink};

    #[test]
    fn test_dispatches_to_every_sink() {
        let first = Arc::new(RecordingSink::new());
        let second = Arc::new(RecordingSink::new());
        let fanout = FanoutSink::default()
            .with_sink(first.clone())
            .with_sink(second.clone());

        fanout.emit(GovernanceEvent::new("req-1", "model"));

        assert_eq!(first.events().len(), 1);
        assert_eq!(second.events().len(), 1);
        assert_eq!(second.events()[0].request_id, "req-1");
    }

    #[test]
    fn test_panicking_sink_does_not_starve_others() {
        let before = Arc::new(RecordingSink::new());
        let after = Arc::new(RecordingSink::new());
        let fanout = FanoutSink::new(vec![
            before.clone() as Arc<dyn EventSink>,
            Arc::new(PanickingSink),
            after.clone(),
        ]);

        fanout.emit(GovernanceEvent::new("req-2", "model"));

        assert_eq!(before.events().len(), 1);
        assert_eq!(after.events().len(), 1);
    }

    #[test]
    fn test_empty_fanout_is_noop() {
        let fanout = FanoutSink::default();
        assert!(fanout.is_empty());
        fanout.emit(GovernanceEvent::new("req-3", "model"));
    }
}
