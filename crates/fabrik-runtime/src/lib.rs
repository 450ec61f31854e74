//! `fabrik-runtime` - IEC 61499 event-chain execution engine with IEC
//! 61131 cyclic semantics and an OPC UA data-point bridge.
//!
//! The engine dispatches events through a function-block graph on one
//! dedicated thread, driven by a periodic cycle timer with bounded-buffer
//! backpressure. The bridge mirrors selected FB data points into an OPC UA
//! address space and turns client writes back into event chains.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

/// Bridge between the FB network and an OPC UA address space.
pub mod bridge;
/// Runtime configuration.
pub mod config;
/// Event-chain execution engine.
pub mod engine;
/// Runtime errors.
pub mod error;
/// Function-block contracts.
pub mod fb;
/// OPC UA wire model, server contract and backends.
pub mod ua;
/// IEC 61131 scalar values.
pub mod value;

pub use bridge::OpcUaBridge;
pub use config::{OpcUaConfig, RuntimeConfig};
pub use engine::{EngineHandle, EngineMetrics, EngineState, EventChainEngine, MgmCommand};
pub use error::RuntimeError;
