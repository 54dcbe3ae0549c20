//! Event Bus - timestamped record of everything the capture engine does
//!
//! The machine emits an event for every transition; binaries log or export
//! them and scenario tests assert on the sequence.

use super::types::CaptureEvent;

/// Timestamped event for the event bus
#[derive(Debug, Clone, PartialEq)]
pub struct BusEvent {
    /// Virtual time in milliseconds since the game was created
    pub time_ms: u64,
    /// The event data
    pub event: CaptureEvent,
}

/// Central event bus
#[derive(Debug, Default)]
pub struct EventBus {
    /// Events emitted since the last drain
    pending: Vec<BusEvent>,

    /// Events that have been drained (kept for export)
    processed: Vec<BusEvent>,

    /// Current virtual time in milliseconds (for timestamping)
    elapsed_ms: u64,

    /// Whether the bus is enabled (simulation batches turn it off)
    enabled: bool,
}

impl EventBus {
    /// Create a new enabled event bus
    pub fn new() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }

    /// Create a disabled event bus (events are dropped)
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Update the timestamp applied to new events
    pub fn update_time(&mut self, elapsed_ms: u64) {
        self.elapsed_ms = elapsed_ms;
    }

    /// Emit an event to the bus
    pub fn emit(&mut self, event: CaptureEvent) {
        if !self.enabled {
            return;
        }
        self.pending.push(BusEvent {
            time_ms: self.elapsed_ms,
            event,
        });
    }

    /// Get pending events (does not drain)
    pub fn peek(&self) -> &[BusEvent] {
        &self.pending
    }

    /// Drain pending events, moving them to processed
    pub fn drain(&mut self) -> Vec<BusEvent> {
        let events = std::mem::take(&mut self.pending);
        self.processed.extend(events.clone());
        events
    }

    /// All drained events
    pub fn processed(&self) -> &[BusEvent] {
        &self.processed
    }

    pub fn clear_processed(&mut self) {
        self.processed.clear();
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
