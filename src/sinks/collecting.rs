// src/sinks/collecting.rs

use crate::provision::{EventSink, ProvisionEvent, ProvisionEventKind};

/// An in-memory event sink that keeps every provisioning event.
///
/// Lets tests assert on the exact status trail a provisioner reports.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: Vec<ProvisionEvent>,
}

impl CollectingEventSink {
    /// Create a new, empty collecting sink.
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Borrow all collected events.
    pub fn events(&self) -> &[ProvisionEvent] {
        &self.events
    }

    /// Status strings reported so far, in order.
    pub fn statuses(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match &e.kind {
                ProvisionEventKind::StatusChanged(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for CollectingEventSink {
    fn emit(&mut self, event: ProvisionEvent) {
        self.events.push(event);
    }
}
