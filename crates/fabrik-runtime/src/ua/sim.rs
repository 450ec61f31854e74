//! In-memory address space for tests and serverless embedding.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::services::{ObjectNodeRequest, UaServices, VariableNodeRequest, WriteCallback};
use super::types::{
    ns0, BrowsePath, BrowsePathResult, UaIdentifier, UaNodeId, UaQualifiedName, UaStatus,
    UaTypeId, UaVariant,
};

#[derive(Clone, Copy, PartialEq, Eq)]
enum NodeClass {
    Object,
    Variable,
}

struct SimNode {
    class: NodeClass,
    browse_name: UaQualifiedName,
    parent: Option<UaNodeId>,
    display_name: SmolStr,
    data_type: Option<UaTypeId>,
    value: Option<UaVariant>,
    callback: Option<WriteCallback>,
}

/// Address space behaving like a local OPC UA server, without the server.
///
/// Client writes are injected with [`SimulatedAddressSpace::client_write`],
/// which stores the value and fires the registered write callback the way
/// the real server does from its session thread.
pub struct SimulatedAddressSpace {
    nodes: Mutex<IndexMap<UaNodeId, SimNode>>,
    next_auto_id: AtomicU32,
}

impl SimulatedAddressSpace {
    /// Address space seeded with the ns-0 Objects folder.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = IndexMap::new();
        nodes.insert(
            ns0::OBJECTS_FOLDER,
            SimNode {
                class: NodeClass::Object,
                browse_name: UaQualifiedName::new(0, "Objects"),
                parent: None,
                display_name: SmolStr::new("Objects"),
                data_type: None,
                value: None,
                callback: None,
            },
        );
        Self {
            nodes: Mutex::new(nodes),
            next_auto_id: AtomicU32::new(1000),
        }
    }

    fn assign_id(&self, requested: &UaNodeId) -> UaNodeId {
        match requested.identifier {
            UaIdentifier::Numeric(0) => UaNodeId::numeric(
                requested.namespace,
                self.next_auto_id.fetch_add(1, Ordering::Relaxed),
            ),
            _ => requested.clone(),
        }
    }

    /// Simulate a client write: store the value, then fire the write
    /// callback outside the node lock.
    pub fn client_write(&self, node: &UaNodeId, value: UaVariant) -> Result<(), UaStatus> {
        let callback = {
            let mut nodes = self.nodes.lock().expect("address space poisoned");
            let entry = nodes.get_mut(node).ok_or(UaStatus::BAD_NODE_ID_UNKNOWN)?;
            if entry.class != NodeClass::Variable {
                return Err(UaStatus::BAD_NODE_CLASS_INVALID);
            }
            entry.value = Some(value.clone());
            entry.callback.clone()
        };
        if let Some(callback) = callback {
            callback(node, &value);
        }
        Ok(())
    }

    /// Stored value of a variable node.
    #[must_use]
    pub fn value_of(&self, node: &UaNodeId) -> Option<UaVariant> {
        let nodes = self.nodes.lock().expect("address space poisoned");
        nodes.get(node).and_then(|entry| entry.value.clone())
    }

    /// Declared data type of a variable node.
    #[must_use]
    pub fn data_type_of(&self, node: &UaNodeId) -> Option<UaTypeId> {
        let nodes = self.nodes.lock().expect("address space poisoned");
        nodes.get(node).and_then(|entry| entry.data_type)
    }

    /// Display name of a node.
    #[must_use]
    pub fn display_name_of(&self, node: &UaNodeId) -> Option<SmolStr> {
        let nodes = self.nodes.lock().expect("address space poisoned");
        nodes.get(node).map(|entry| entry.display_name.clone())
    }

    /// Parent of a node.
    #[must_use]
    pub fn parent_of(&self, node: &UaNodeId) -> Option<UaNodeId> {
        let nodes = self.nodes.lock().expect("address space poisoned");
        nodes.get(node).and_then(|entry| entry.parent.clone())
    }

    /// Children of a node, in insertion order.
    #[must_use]
    pub fn children_of(&self, parent: &UaNodeId) -> Vec<UaNodeId> {
        let nodes = self.nodes.lock().expect("address space poisoned");
        nodes
            .iter()
            .filter(|(_, entry)| entry.parent.as_ref() == Some(parent))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Total node count, the seeded Objects folder included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.lock().expect("address space poisoned").len()
    }

    fn insert_node(
        &self,
        requested: &UaNodeId,
        parent: &UaNodeId,
        node: impl FnOnce(UaNodeId) -> SimNode,
    ) -> Result<UaNodeId, UaStatus> {
        let mut nodes = self.nodes.lock().expect("address space poisoned");
        if !nodes.contains_key(parent) {
            return Err(UaStatus::BAD_PARENT_NODE_ID_INVALID);
        }
        let id = self.assign_id(requested);
        if nodes.contains_key(&id) {
            return Err(UaStatus::BAD_NODE_ID_EXISTS);
        }
        nodes.insert(id.clone(), node(id.clone()));
        Ok(id)
    }

    fn resolve_one(nodes: &IndexMap<UaNodeId, SimNode>, path: &BrowsePath) -> BrowsePathResult {
        if !nodes.contains_key(&path.starting_node) {
            return BrowsePathResult {
                status: UaStatus::BAD_NODE_ID_UNKNOWN,
                targets: Vec::new(),
            };
        }
        let mut frontier = vec![path.starting_node.clone()];
        for element in &path.elements {
            let mut next = Vec::new();
            for parent in &frontier {
                for (id, node) in nodes.iter() {
                    if node.parent.as_ref() == Some(parent)
                        && node.browse_name == element.target_name
                    {
                        next.push(id.clone());
                    }
                }
            }
            if next.is_empty() {
                return BrowsePathResult {
                    status: UaStatus::BAD_NO_MATCH,
                    targets: Vec::new(),
                };
            }
            frontier = next;
        }
        BrowsePathResult {
            status: UaStatus::GOOD,
            targets: frontier,
        }
    }
}

impl Default for SimulatedAddressSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl UaServices for SimulatedAddressSpace {
    fn add_object_node(&self, request: &ObjectNodeRequest) -> Result<UaNodeId, UaStatus> {
        self.insert_node(&request.requested_id, &request.parent, |_| SimNode {
            class: NodeClass::Object,
            browse_name: request.browse_name.clone(),
            parent: Some(request.parent.clone()),
            display_name: request.display_name.clone(),
            data_type: None,
            value: None,
            callback: None,
        })
    }

    fn add_variable_node(&self, request: &VariableNodeRequest) -> Result<UaNodeId, UaStatus> {
        self.insert_node(&request.requested_id, &request.parent, |_| SimNode {
            class: NodeClass::Variable,
            browse_name: request.browse_name.clone(),
            parent: Some(request.parent.clone()),
            display_name: request.display_name.clone(),
            data_type: Some(request.data_type),
            value: Some(request.value.clone()),
            callback: None,
        })
    }

    fn read_node_id(&self, node: &UaNodeId) -> Result<UaNodeId, UaStatus> {
        let nodes = self.nodes.lock().expect("address space poisoned");
        if nodes.contains_key(node) {
            Ok(node.clone())
        } else {
            Err(UaStatus::BAD_NODE_ID_UNKNOWN)
        }
    }

    fn write_value(&self, node: &UaNodeId, value: UaVariant) -> Result<(), UaStatus> {
        let mut nodes = self.nodes.lock().expect("address space poisoned");
        let entry = nodes.get_mut(node).ok_or(UaStatus::BAD_NODE_ID_UNKNOWN)?;
        if entry.class != NodeClass::Variable {
            return Err(UaStatus::BAD_NODE_CLASS_INVALID);
        }
        if let Some(data_type) = entry.data_type {
            if data_type != UaTypeId::Variant && value.type_id() != data_type {
                return Err(UaStatus::BAD_TYPE_MISMATCH);
            }
        }
        entry.value = Some(value);
        Ok(())
    }

    fn set_write_callback(
        &self,
        node: &UaNodeId,
        callback: WriteCallback,
    ) -> Result<(), UaStatus> {
        let mut nodes = self.nodes.lock().expect("address space poisoned");
        let entry = nodes.get_mut(node).ok_or(UaStatus::BAD_NODE_ID_UNKNOWN)?;
        if entry.class != NodeClass::Variable {
            return Err(UaStatus::BAD_NODE_CLASS_INVALID);
        }
        entry.callback = Some(callback);
        Ok(())
    }

    fn translate_browse_paths(
        &self,
        paths: &[BrowsePath],
    ) -> Result<Vec<BrowsePathResult>, UaStatus> {
        let nodes = self.nodes.lock().expect("address space poisoned");
        Ok(paths
            .iter()
            .map(|path| Self::resolve_one(&nodes, path))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::types::RelativePathElement;
    use super::*;

    fn object_request(name: &str, parent: UaNodeId) -> ObjectNodeRequest {
        ObjectNodeRequest {
            requested_id: UaNodeId::numeric(1, 0),
            parent,
            reference_type: ns0::HAS_COMPONENT,
            browse_name: UaQualifiedName::new(0, name),
            type_definition: ns0::FOLDER_TYPE,
            display_name: name.into(),
            description: name.into(),
        }
    }

    #[test]
    fn auto_ids_are_assigned_and_unique() {
        let space = SimulatedAddressSpace::new();
        let a = space
            .add_object_node(&object_request("A", ns0::OBJECTS_FOLDER))
            .expect("add A");
        let b = space
            .add_object_node(&object_request("B", ns0::OBJECTS_FOLDER))
            .expect("add B");
        assert_ne!(a, b);
        assert_eq!(space.parent_of(&a), Some(ns0::OBJECTS_FOLDER));
    }

    #[test]
    fn missing_parent_is_rejected() {
        let space = SimulatedAddressSpace::new();
        let err = space
            .add_object_node(&object_request("A", UaNodeId::numeric(1, 99)))
            .unwrap_err();
        assert_eq!(err, UaStatus::BAD_PARENT_NODE_ID_INVALID);
    }

    #[test]
    fn translate_walks_browse_names() {
        let space = SimulatedAddressSpace::new();
        let a = space
            .add_object_node(&object_request("A", ns0::OBJECTS_FOLDER))
            .expect("add A");
        let b = space
            .add_object_node(&object_request("B", a.clone()))
            .expect("add B");
        let path = BrowsePath {
            starting_node: ns0::OBJECTS_FOLDER,
            elements: vec![
                RelativePathElement {
                    reference_type: ns0::HAS_COMPONENT,
                    target_name: UaQualifiedName::new(0, "A"),
                },
                RelativePathElement {
                    reference_type: ns0::HAS_COMPONENT,
                    target_name: UaQualifiedName::new(0, "B"),
                },
            ],
        };
        let results = space.translate_browse_paths(&[path]).expect("translate");
        assert_eq!(results.len(), 1);
        assert!(results[0].status.is_good());
        assert_eq!(results[0].targets, vec![b]);
    }

    #[test]
    fn client_write_fires_the_callback() {
        let space = SimulatedAddressSpace::new();
        let var = space
            .add_variable_node(&VariableNodeRequest {
                requested_id: UaNodeId::string(1, "V"),
                parent: ns0::OBJECTS_FOLDER,
                reference_type: ns0::HAS_COMPONENT,
                browse_name: UaQualifiedName::new(0, "V"),
                data_type: UaTypeId::Int32,
                value: UaVariant::Int32(0),
                display_name: "V".into(),
                description: "V".into(),
            })
            .expect("add variable");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        space
            .set_write_callback(
                &var,
                Arc::new(move |_, value| sink.lock().unwrap().push(value.clone())),
            )
            .expect("register callback");
        space
            .client_write(&var, UaVariant::Int32(7))
            .expect("client write");
        assert_eq!(*seen.lock().unwrap(), vec![UaVariant::Int32(7)]);
        assert_eq!(space.value_of(&var), Some(UaVariant::Int32(7)));
    }
}
