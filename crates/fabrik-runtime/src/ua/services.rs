//! Contract between the bridge and the OPC UA server stack.

use std::sync::Arc;

use smol_str::SmolStr;

use super::types::{
    BrowsePath, BrowsePathResult, UaNodeId, UaQualifiedName, UaStatus, UaTypeId, UaVariant,
};

/// Attributes for a new object node.
///
/// A numeric requested id of 0 asks the server to assign one.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub struct ObjectNodeRequest {
    pub requested_id: UaNodeId,
    pub parent: UaNodeId,
    pub reference_type: UaNodeId,
    pub browse_name: UaQualifiedName,
    pub type_definition: UaNodeId,
    pub display_name: SmolStr,
    pub description: SmolStr,
}

/// Attributes for a new variable node.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub struct VariableNodeRequest {
    pub requested_id: UaNodeId,
    pub parent: UaNodeId,
    pub reference_type: UaNodeId,
    pub browse_name: UaQualifiedName,
    pub data_type: UaTypeId,
    pub value: UaVariant,
    pub display_name: SmolStr,
    pub description: SmolStr,
}

/// Callback invoked from the server context when a client writes a
/// variable node.
pub type WriteCallback = Arc<dyn Fn(&UaNodeId, &UaVariant) + Send + Sync>;

/// Server-side services the bridge consumes.
///
/// Implemented by [`super::SimulatedAddressSpace`] for tests and serverless
/// embedding, and by the `opcua`-crate backend when the `opcua` feature is
/// enabled. All methods may be called from the dispatcher thread and from
/// the server's own threads.
pub trait UaServices: Send + Sync {
    /// Add an object node, returning its assigned id.
    fn add_object_node(&self, request: &ObjectNodeRequest) -> Result<UaNodeId, UaStatus>;

    /// Add a variable node, returning its assigned id.
    fn add_variable_node(&self, request: &VariableNodeRequest) -> Result<UaNodeId, UaStatus>;

    /// Confirm a node exists, returning its canonical id.
    fn read_node_id(&self, node: &UaNodeId) -> Result<UaNodeId, UaStatus>;

    /// Write a scalar value to a variable node.
    fn write_value(&self, node: &UaNodeId, value: UaVariant) -> Result<(), UaStatus>;

    /// Register a callback fired on every client write to a variable node.
    fn set_write_callback(&self, node: &UaNodeId, callback: WriteCallback)
        -> Result<(), UaStatus>;

    /// Resolve a batch of browse paths in one request.
    fn translate_browse_paths(
        &self,
        paths: &[BrowsePath],
    ) -> Result<Vec<BrowsePathResult>, UaStatus>;
}

impl std::fmt::Debug for dyn UaServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("UaServices")
    }
}
