//! Engine counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared between the dispatcher, the timer and the enqueue
/// paths.
#[derive(Debug, Default)]
pub(crate) struct EngineCounters {
    pub dispatched: AtomicU64,
    pub dropped: AtomicU64,
    pub cycles: AtomicU64,
    pub collapsed_ticks: AtomicU64,
    pub deadline_misses: AtomicU64,
}

impl EngineCounters {
    pub fn snapshot(&self) -> EngineMetrics {
        EngineMetrics {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            cycles: self.cycles.load(Ordering::Relaxed),
            collapsed_ticks: self.collapsed_ticks.load(Ordering::Relaxed),
            deadline_misses: self.deadline_misses.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of the engine counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineMetrics {
    /// Events delivered to function blocks, including failed deliveries.
    pub dispatched: u64,
    /// Events dropped because a queue was full.
    pub dropped: u64,
    /// Completed cycles (queue drained, dispatcher suspended).
    pub cycles: u64,
    /// Timer expiries that collapsed onto a pending tick.
    pub collapsed_ticks: u64,
    /// Cycles whose dispatch work exceeded the configured deadline.
    pub deadline_misses: u64,
}
