//! OPC UA wire model, server contract and backends.

mod services;
#[cfg(feature = "opcua")]
mod server;
mod sim;
mod types;

pub use services::{ObjectNodeRequest, UaServices, VariableNodeRequest, WriteCallback};
#[cfg(feature = "opcua")]
pub use server::OpcUaServerBackend;
pub use sim::SimulatedAddressSpace;
pub use types::{
    ns0, BrowsePath, BrowsePathResult, RelativePathElement, UaIdentifier, UaNodeId,
    UaQualifiedName, UaStatus, UaTypeId, UaVariant,
};
