//! FB and data-point node registry.

use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::{debug, error};

use crate::error::RuntimeError;
use crate::fb::{FunctionBlock, PortId};
use crate::ua::{
    ns0, ObjectNodeRequest, UaNodeId, UaQualifiedName, UaServices, UaStatus, UaVariant,
    VariableNodeRequest,
};
use crate::value::IecValue;

use super::typemap;

#[derive(Debug, Default)]
struct RegistryCache {
    fb_nodes: IndexMap<SmolStr, UaNodeId>,
    port_nodes: IndexMap<(SmolStr, SmolStr), UaNodeId>,
}

/// Creates, looks up and caches address-space nodes for function blocks and
/// their output data points.
///
/// Variable node identifiers are the bare port names (flat); two blocks
/// sharing a port name resolve to the same node. Known limitation.
pub struct NodeRegistry {
    services: Arc<dyn UaServices>,
    namespace: u16,
    cache: Mutex<RegistryCache>,
}

impl NodeRegistry {
    /// Registry over the given services, assigning ids in `namespace`.
    pub fn new(services: Arc<dyn UaServices>, namespace: u16) -> Self {
        Self {
            services,
            namespace,
            cache: Mutex::new(RegistryCache::default()),
        }
    }

    /// Object node for a function block, created under the Objects folder
    /// on first use.
    pub fn object_node_for(&self, fb: &dyn FunctionBlock) -> Result<UaNodeId, RuntimeError> {
        let name = fb.instance_name().clone();
        {
            let cache = self.cache.lock().expect("node registry poisoned");
            if let Some(id) = cache.fb_nodes.get(&name) {
                return Ok(id.clone());
            }
        }
        let requested = UaNodeId::string(self.namespace, name.clone());
        let id = match self.services.read_node_id(&requested) {
            Ok(id) => id,
            Err(_) => self.create_object_node(&name, requested)?,
        };
        self.cache
            .lock()
            .expect("node registry poisoned")
            .fb_nodes
            .insert(name, id.clone());
        Ok(id)
    }

    fn create_object_node(
        &self,
        name: &SmolStr,
        requested: UaNodeId,
    ) -> Result<UaNodeId, RuntimeError> {
        let request = ObjectNodeRequest {
            requested_id: requested,
            parent: ns0::OBJECTS_FOLDER,
            reference_type: ns0::ORGANIZES,
            browse_name: UaQualifiedName::new(0, name.clone()),
            type_definition: ns0::FOLDER_TYPE,
            display_name: SmolStr::new(format!("FB-{name}")),
            description: SmolStr::new(format!("Object node of function block {name}")),
        };
        let id = self.services.add_object_node(&request).map_err(|status| {
            error!(%status, fb = %name, "could not add object node");
            RuntimeError::Service(status)
        })?;
        debug!(fb = %name, node = %id, "object node added");
        Ok(id)
    }

    /// Variable node for an output data point, created under the block's
    /// object node on first use.
    pub fn variable_node_for(
        &self,
        fb: &dyn FunctionBlock,
        port_id: PortId,
    ) -> Result<UaNodeId, RuntimeError> {
        let spec = fb.interface_spec();
        let port = spec
            .data_outputs
            .get(usize::from(port_id))
            .ok_or(RuntimeError::InvalidPortId(port_id))?;
        let key = (fb.instance_name().clone(), port.name.clone());
        {
            let cache = self.cache.lock().expect("node registry poisoned");
            if let Some(id) = cache.port_nodes.get(&key) {
                return Ok(id.clone());
            }
        }

        let parent = self.object_node_for(fb)?;
        let requested = UaNodeId::string(self.namespace, port.name.clone());
        let id = match self.services.read_node_id(&requested) {
            Ok(id) => id,
            Err(_) => {
                let initial = IecValue::default_for(port.ty)
                    .map(|value| typemap::ua_variant_for(&value))
                    .unwrap_or(UaVariant::Empty);
                let request = VariableNodeRequest {
                    requested_id: requested,
                    parent,
                    reference_type: ns0::HAS_COMPONENT,
                    browse_name: UaQualifiedName::new(0, port.name.clone()),
                    data_type: typemap::ua_type_for(port.ty),
                    value: initial,
                    display_name: SmolStr::new(format!("{}-{}", fb.instance_name(), port.name)),
                    description: SmolStr::new(format!(
                        "Output data point {} of {}",
                        port.name,
                        fb.instance_name()
                    )),
                };
                self.services
                    .add_variable_node(&request)
                    .map_err(|status| {
                        error!(%status, fb = %fb.instance_name(), port = %port.name, "could not add variable node");
                        RuntimeError::Service(status)
                    })?
            }
        };
        debug!(fb = %fb.instance_name(), port = %port.name, node = %id, "variable node ready");
        self.cache
            .lock()
            .expect("node registry poisoned")
            .port_nodes
            .insert(key, id.clone());
        Ok(id)
    }

    /// Write a fresh scalar of the mapped type to a node.
    ///
    /// A type mismatch against the stored node type is a programmer error:
    /// it panics in development builds and is logged in production.
    pub fn update_node_value(
        &self,
        node: &UaNodeId,
        value: &IecValue,
    ) -> Result<(), RuntimeError> {
        let variant = typemap::ua_variant_for(value);
        self.services.write_value(node, variant).map_err(|status| {
            if status == UaStatus::BAD_TYPE_MISMATCH {
                debug_assert!(
                    false,
                    "iec value {:?} does not match the stored type of node {node}",
                    value.iec_type()
                );
            }
            error!(%status, %node, "could not update node value");
            RuntimeError::Service(status)
        })
    }
}
