use std::collections::VecDeque;

/// Recorded UI event for traceability.
///
/// Controllers emit these as they act so tests and the debug console can see
/// what happened in which order without scraping the DOM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub seq: u64,
    pub kind: &'static str,
    pub message: String,
}

/// Events kept when no capacity is given.
pub const DEFAULT_CAPACITY: usize = 256;

/// Ring of the most recent events; the oldest is dropped once full.
#[derive(Debug)]
pub struct EventBus {
    next_seq: u64,
    capacity: usize,
    events: VecDeque<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// A zero capacity is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            next_seq: 0,
            capacity,
            events: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn emit(&mut self, kind: &'static str, message: impl Into<String>) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(Event {
            seq,
            kind,
            message: message.into(),
        });
    }

    pub fn events(&self) -> &VecDeque<Event> {
        &self.events
    }

    pub fn count(&self, kind: &str) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    pub fn drain(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::EventBus;

    #[test]
    fn records_events_in_sequence() {
        let mut bus = EventBus::new();
        bus.emit("layer", "streets");
        bus.emit("overlay", "temp");
        assert_eq!(bus.events().len(), 2);
        assert_eq!(bus.events()[0].seq, 0);
        assert_eq!(bus.events()[1].seq, 1);
        assert_eq!(bus.count("layer"), 1);
    }

    #[test]
    fn drain_clears_events_but_keeps_sequence() {
        let mut bus = EventBus::new();
        bus.emit("k", "m");
        let drained = bus.drain();
        assert_eq!(drained.len(), 1);
        assert!(bus.events().is_empty());
        bus.emit("k", "n");
        assert_eq!(bus.events()[0].seq, 1);
    }

    #[test]
    fn full_bus_drops_oldest() {
        let mut bus = EventBus::with_capacity(3);
        for i in 0..1000 {
            bus.emit("poll", format!("tick {i}"));
        }
        assert_eq!(bus.events().len(), 3);
        assert_eq!(bus.events()[0].seq, 997);
        assert_eq!(bus.events()[2].message, "tick 999");
        assert_eq!(bus.count("poll"), 3);
    }
}
