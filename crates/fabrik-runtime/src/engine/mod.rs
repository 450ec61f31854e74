//! Event-chain execution with IEC 61131 cyclic semantics.

mod core;
mod metrics;
mod queue;
mod sync;
mod timer;

pub use self::core::{EngineHandle, EngineState, EventChainEngine, MgmCommand};
pub use metrics::EngineMetrics;
pub use queue::{EventQueue, EVENT_QUEUE_CAPACITY};
