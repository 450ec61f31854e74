//! Bridge between the function-block network and an OPC UA address space.

mod path;
mod registry;
mod typemap;
mod write;

pub use path::PathResolver;
pub use registry::NodeRegistry;
pub use typemap::{iec_value_from, ua_type_for, ua_type_for_code, ua_variant_for};
pub use write::read_back_data_point;

use std::sync::Arc;

use crate::config::OpcUaConfig;
use crate::engine::EngineHandle;
use crate::error::RuntimeError;
use crate::fb::{CommLayer, FunctionBlock, PortId};
use crate::ua::{UaNodeId, UaServices};
use crate::value::IecValue;

/// Bridge between the FB network and one OPC UA server instance.
///
/// Constructed explicitly and handed to the communication layers that need
/// it; one bridge per server instance.
pub struct OpcUaBridge {
    services: Arc<dyn UaServices>,
    registry: NodeRegistry,
    resolver: PathResolver,
}

impl OpcUaBridge {
    /// Bridge over the given server services.
    pub fn new(services: Arc<dyn UaServices>, config: &OpcUaConfig) -> Self {
        let registry = NodeRegistry::new(services.clone(), config.namespace);
        let resolver = PathResolver::new(services.clone(), config.namespace);
        Self {
            services,
            registry,
            resolver,
        }
    }

    /// The underlying server services.
    #[must_use]
    pub fn services(&self) -> &Arc<dyn UaServices> {
        &self.services
    }

    /// The node registry.
    #[must_use]
    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// The path resolver.
    #[must_use]
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Publish an FB output data point, creating its nodes on demand.
    pub fn publish_data_point(
        &self,
        fb: &dyn FunctionBlock,
        port_id: PortId,
    ) -> Result<UaNodeId, RuntimeError> {
        self.registry.variable_node_for(fb, port_id)
    }

    /// Push a new value to a published data point.
    pub fn update_data_point(
        &self,
        node: &UaNodeId,
        value: &IecValue,
    ) -> Result<(), RuntimeError> {
        self.registry.update_node_value(node, value)
    }

    /// Resolve a `/Objects/...` browse path.
    pub fn node_for_path(
        &self,
        path: &str,
        create_if_not_found: bool,
    ) -> Result<UaNodeId, RuntimeError> {
        self.resolver.resolve(path, create_if_not_found)
    }

    /// Bind client writes on `node` to a communication layer.
    pub fn register_write_binding(
        &self,
        node: &UaNodeId,
        layer: Arc<dyn CommLayer>,
        engine: EngineHandle,
    ) -> Result<(), RuntimeError> {
        write::register_write_binding(&self.services, node, layer, engine)
    }
}
