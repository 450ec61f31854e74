//! Bounded event queues.

use tracing::error;

use crate::fb::EventEntry;

/// Default capacity of the init and run queues.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

/// Fixed-capacity FIFO of pending event deliveries.
///
/// Writes occur at the tail, reads at the head. An occupied slot at the
/// tail means the ring is full; the entry is then dropped and an error is
/// logged. Backpressure is by drop, never by block.
#[derive(Debug)]
pub struct EventQueue {
    slots: Vec<Option<EventEntry>>,
    head: usize,
    tail: usize,
    dropped: u64,
}

impl EventQueue {
    /// Queue with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(EVENT_QUEUE_CAPACITY)
    }

    /// Queue with an explicit capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "event queue capacity must be non-zero");
        Self {
            slots: vec![None; capacity],
            head: 0,
            tail: 0,
            dropped: 0,
        }
    }

    /// Append an entry at the tail.
    ///
    /// Returns `false` when the queue is full; the entry is dropped and the
    /// drop is logged and counted.
    pub fn try_enqueue(&mut self, entry: EventEntry) -> bool {
        if self.slots[self.tail].is_some() {
            self.dropped += 1;
            error!("Event queue is full, event dropped");
            return false;
        }
        self.slots[self.tail] = Some(entry);
        self.tail = (self.tail + 1) % self.slots.len();
        true
    }

    /// Take the entry at the head, if any.
    pub fn try_dequeue(&mut self) -> Option<EventEntry> {
        let entry = self.slots[self.head].take()?;
        self.head = (self.head + 1) % self.slots.len();
        Some(entry)
    }

    /// Whether no entry is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots[self.head].is_none()
    }

    /// Number of pending entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Capacity of the ring.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of entries dropped because the queue was full.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Discard all pending entries and reset the ring.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.head = 0;
        self.tail = 0;
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use smol_str::SmolStr;

    use crate::engine::EngineHandle;
    use crate::fb::{FbInterfaceSpec, FunctionBlock, PortId};

    use super::*;

    struct NoopFb {
        name: SmolStr,
        interface: FbInterfaceSpec,
    }

    impl NoopFb {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                name: SmolStr::new("NOOP"),
                interface: FbInterfaceSpec::default(),
            })
        }
    }

    impl FunctionBlock for NoopFb {
        fn receive_input_event(&self, _port_id: PortId, _engine: &EngineHandle) {}

        fn instance_name(&self) -> &SmolStr {
            &self.name
        }

        fn interface_spec(&self) -> &FbInterfaceSpec {
            &self.interface
        }
    }

    #[test]
    fn entries_come_out_in_fifo_order() {
        let fb = NoopFb::new();
        let mut queue = EventQueue::with_capacity(8);
        for port in 0..5 {
            assert!(queue.try_enqueue(EventEntry::new(&fb, port)));
        }
        for port in 0..5 {
            assert_eq!(queue.try_dequeue().map(|e| e.port_id()), Some(port));
        }
        assert!(queue.try_dequeue().is_none());
    }

    #[test]
    fn full_queue_drops_and_counts() {
        let fb = NoopFb::new();
        let mut queue = EventQueue::with_capacity(4);
        for port in 0..6 {
            let accepted = queue.try_enqueue(EventEntry::new(&fb, port));
            assert_eq!(accepted, port < 4);
        }
        assert_eq!(queue.len(), 4);
        assert_eq!(queue.dropped(), 2);
    }

    #[test]
    fn ring_wraps_across_the_boundary() {
        let fb = NoopFb::new();
        let mut queue = EventQueue::with_capacity(3);
        for round in 0..4u16 {
            assert!(queue.try_enqueue(EventEntry::new(&fb, round * 2)));
            assert!(queue.try_enqueue(EventEntry::new(&fb, round * 2 + 1)));
            assert_eq!(queue.try_dequeue().map(|e| e.port_id()), Some(round * 2));
            assert_eq!(
                queue.try_dequeue().map(|e| e.port_id()),
                Some(round * 2 + 1)
            );
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn clear_resets_the_ring() {
        let fb = NoopFb::new();
        let mut queue = EventQueue::with_capacity(4);
        for port in 0..3 {
            queue.try_enqueue(EventEntry::new(&fb, port));
        }
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert!(queue.try_enqueue(EventEntry::new(&fb, 9)));
        assert_eq!(queue.try_dequeue().map(|e| e.port_id()), Some(9));
    }
}
