//! OPC UA server backend over the `opcua` crate.

#![allow(missing_docs)]

use std::sync::Arc;

use opcua::server::address_space::relative_path::find_nodes_relative_path;
use opcua::server::prelude::*;
use opcua::sync::RwLock;
use opcua::types::Identifier;
use tracing::{debug, error};

use crate::config::OpcUaConfig;

use super::services::{ObjectNodeRequest, UaServices, VariableNodeRequest, WriteCallback};
use super::types::{
    ns0, BrowsePath, BrowsePathResult, UaIdentifier, UaNodeId, UaStatus, UaTypeId, UaVariant,
};

const UNIX_EPOCH_TICKS: i64 = 116_444_736_000_000_000;

/// Backend serving the bridge from a real `opcua` server instance.
///
/// Browse-path translation is answered from the local address space; the
/// endpoint in the configuration is what external clients connect to.
pub struct OpcUaServerBackend {
    server: Arc<RwLock<Server>>,
    address_space: Arc<RwLock<AddressSpace>>,
}

impl OpcUaServerBackend {
    /// Build a server listening on the configured port.
    #[must_use]
    pub fn new(config: &OpcUaConfig) -> Self {
        let mut server_config = ServerBuilder::new_anonymous("fabrik-runtime")
            .application_uri(config.application_uri.as_str())
            .product_uri(config.application_uri.as_str())
            .config();
        server_config.tcp_config.host = "0.0.0.0".to_string();
        server_config.tcp_config.port = config.port;

        let server = Server::new(server_config);
        let address_space = server.address_space();
        {
            let mut space = address_space.write();
            if space
                .register_namespace(config.application_uri.as_str())
                .is_err()
            {
                error!("could not register application namespace");
            }
        }
        Self {
            server: Arc::new(RwLock::new(server)),
            address_space,
        }
    }

    /// Run the server I/O loop on the current thread until [`Self::abort`].
    pub fn run(&self) {
        Server::run_server(self.server.clone());
    }

    /// Stop the server I/O loop.
    pub fn abort(&self) {
        self.server.write().abort();
    }
}

fn to_node_id(id: &UaNodeId) -> NodeId {
    match &id.identifier {
        UaIdentifier::Numeric(value) => NodeId::new(id.namespace, *value),
        UaIdentifier::String(value) => NodeId::new(id.namespace, value.as_str()),
    }
}

fn from_node_id(id: &NodeId) -> UaNodeId {
    match &id.identifier {
        Identifier::Numeric(value) => UaNodeId::numeric(id.namespace, *value),
        Identifier::String(value) => UaNodeId::string(id.namespace, value.to_string()),
        other => UaNodeId::string(id.namespace, format!("{other:?}")),
    }
}

fn to_data_type(ty: UaTypeId) -> DataTypeId {
    match ty {
        UaTypeId::Variant => DataTypeId::BaseDataType,
        UaTypeId::Boolean => DataTypeId::Boolean,
        UaTypeId::SByte => DataTypeId::SByte,
        UaTypeId::Byte => DataTypeId::Byte,
        UaTypeId::Int16 => DataTypeId::Int16,
        UaTypeId::UInt16 => DataTypeId::UInt16,
        UaTypeId::Int32 => DataTypeId::Int32,
        UaTypeId::UInt32 => DataTypeId::UInt32,
        UaTypeId::Int64 => DataTypeId::Int64,
        UaTypeId::UInt64 => DataTypeId::UInt64,
        UaTypeId::Float => DataTypeId::Float,
        UaTypeId::Double => DataTypeId::Double,
        UaTypeId::String => DataTypeId::String,
        UaTypeId::DateTime => DataTypeId::DateTime,
    }
}

fn ua_datetime(unix_ms: i64) -> DateTime {
    DateTime::from(unix_ms.saturating_mul(10_000).saturating_add(UNIX_EPOCH_TICKS))
}

fn to_variant(value: &UaVariant) -> Variant {
    match value {
        UaVariant::Empty => Variant::Empty,
        UaVariant::Boolean(v) => Variant::from(*v),
        UaVariant::SByte(v) => Variant::from(*v),
        UaVariant::Byte(v) => Variant::from(*v),
        UaVariant::Int16(v) => Variant::from(*v),
        UaVariant::UInt16(v) => Variant::from(*v),
        UaVariant::Int32(v) => Variant::from(*v),
        UaVariant::UInt32(v) => Variant::from(*v),
        UaVariant::Int64(v) => Variant::from(*v),
        UaVariant::UInt64(v) => Variant::from(*v),
        UaVariant::Float(v) => Variant::from(*v),
        UaVariant::Double(v) => Variant::from(*v),
        UaVariant::String(v) => Variant::from(v.as_str()),
        UaVariant::DateTime(v) => Variant::from(ua_datetime(*v)),
    }
}

fn from_variant(value: &Variant) -> UaVariant {
    match value {
        Variant::Boolean(v) => UaVariant::Boolean(*v),
        Variant::SByte(v) => UaVariant::SByte(*v),
        Variant::Byte(v) => UaVariant::Byte(*v),
        Variant::Int16(v) => UaVariant::Int16(*v),
        Variant::UInt16(v) => UaVariant::UInt16(*v),
        Variant::Int32(v) => UaVariant::Int32(*v),
        Variant::UInt32(v) => UaVariant::UInt32(*v),
        Variant::Int64(v) => UaVariant::Int64(*v),
        Variant::UInt64(v) => UaVariant::UInt64(*v),
        Variant::Float(v) => UaVariant::Float(*v),
        Variant::Double(v) => UaVariant::Double(*v),
        Variant::String(v) => UaVariant::String(v.to_string().into()),
        Variant::DateTime(v) => {
            UaVariant::DateTime((v.ticks() - UNIX_EPOCH_TICKS) / 10_000)
        }
        _ => UaVariant::Empty,
    }
}

fn status(code: StatusCode) -> UaStatus {
    UaStatus(code.bits())
}

impl UaServices for OpcUaServerBackend {
    fn add_object_node(&self, request: &ObjectNodeRequest) -> Result<UaNodeId, UaStatus> {
        let mut space = self.address_space.write();
        let node_id = match request.requested_id.identifier {
            UaIdentifier::Numeric(0) => NodeId::next_numeric(request.requested_id.namespace),
            _ => to_node_id(&request.requested_id),
        };
        let parent = to_node_id(&request.parent);
        let mut builder = ObjectBuilder::new(
            &node_id,
            QualifiedName::new(request.browse_name.namespace, request.browse_name.name.as_str()),
            request.display_name.as_str(),
        )
        .description(request.description.as_str())
        .has_type_definition(ObjectTypeId::FolderType);
        builder = if request.reference_type == ns0::ORGANIZES {
            builder.organized_by(parent)
        } else {
            builder.component_of(parent)
        };
        if builder.insert(&mut space) {
            debug!(node = %request.display_name, "object node added");
            Ok(from_node_id(&node_id))
        } else {
            Err(UaStatus::BAD_INTERNAL_ERROR)
        }
    }

    fn add_variable_node(&self, request: &VariableNodeRequest) -> Result<UaNodeId, UaStatus> {
        let mut space = self.address_space.write();
        let node_id = match request.requested_id.identifier {
            UaIdentifier::Numeric(0) => NodeId::next_numeric(request.requested_id.namespace),
            _ => to_node_id(&request.requested_id),
        };
        let parent = to_node_id(&request.parent);
        let builder = VariableBuilder::new(
            &node_id,
            QualifiedName::new(request.browse_name.namespace, request.browse_name.name.as_str()),
            request.display_name.as_str(),
        )
        .description(request.description.as_str())
        .data_type(to_data_type(request.data_type))
        .value(to_variant(&request.value))
        .writable()
        .component_of(parent);
        if builder.insert(&mut space) {
            debug!(node = %request.display_name, "variable node added");
            Ok(from_node_id(&node_id))
        } else {
            Err(UaStatus::BAD_INTERNAL_ERROR)
        }
    }

    fn read_node_id(&self, node: &UaNodeId) -> Result<UaNodeId, UaStatus> {
        let space = self.address_space.read();
        let node_id = to_node_id(node);
        if space.find_node(&node_id).is_some() {
            Ok(node.clone())
        } else {
            Err(UaStatus::BAD_NODE_ID_UNKNOWN)
        }
    }

    fn write_value(&self, node: &UaNodeId, value: UaVariant) -> Result<(), UaStatus> {
        let mut space = self.address_space.write();
        let now = DateTime::now();
        if space.set_variable_value(to_node_id(node), to_variant(&value), &now, &now) {
            Ok(())
        } else {
            Err(UaStatus::BAD_NODE_ID_UNKNOWN)
        }
    }

    fn set_write_callback(
        &self,
        node: &UaNodeId,
        callback: WriteCallback,
    ) -> Result<(), UaStatus> {
        let mut space = self.address_space.write();
        let node_id = to_node_id(node);
        let our_id = node.clone();
        match space.find_node_mut(&node_id) {
            Some(NodeType::Variable(variable)) => {
                let setter = AttrFnSetter::new(
                    move |_node_id: &NodeId,
                          _attribute_id: AttributeId,
                          _index_range: NumericRange,
                          data_value: DataValue|
                          -> Result<(), StatusCode> {
                        if let Some(variant) = data_value.value {
                            callback(&our_id, &from_variant(&variant));
                        }
                        Ok(())
                    },
                );
                variable.set_value_setter(Arc::new(opcua::sync::Mutex::new(setter)));
                Ok(())
            }
            Some(_) => Err(UaStatus::BAD_NODE_CLASS_INVALID),
            None => Err(UaStatus::BAD_NODE_ID_UNKNOWN),
        }
    }

    fn translate_browse_paths(
        &self,
        paths: &[BrowsePath],
    ) -> Result<Vec<BrowsePathResult>, UaStatus> {
        let space = self.address_space.read();
        let results = paths
            .iter()
            .map(|path| {
                let starting_node = to_node_id(&path.starting_node);
                let elements: Vec<RelativePathElement> = path
                    .elements
                    .iter()
                    .map(|element| RelativePathElement {
                        reference_type_id: ReferenceTypeId::HierarchicalReferences.into(),
                        is_inverse: false,
                        include_subtypes: true,
                        target_name: QualifiedName::new(
                            element.target_name.namespace,
                            element.target_name.name.as_str(),
                        ),
                    })
                    .collect();
                let relative_path = RelativePath {
                    elements: Some(elements),
                };
                match find_nodes_relative_path(&space, &starting_node, &relative_path) {
                    Ok(targets) => BrowsePathResult {
                        status: UaStatus::GOOD,
                        targets: targets.iter().map(from_node_id).collect(),
                    },
                    Err(code) => BrowsePathResult {
                        status: status(code),
                        targets: Vec::new(),
                    },
                }
            })
            .collect();
        Ok(results)
    }
}
