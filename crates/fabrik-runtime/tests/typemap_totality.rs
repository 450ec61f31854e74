use std::sync::Arc;

use fabrik_runtime::bridge::{ua_type_for, NodeRegistry};
use fabrik_runtime::fb::{DataPortSpec, FbInterfaceSpec, FunctionBlock, PortId};
use fabrik_runtime::ua::{SimulatedAddressSpace, UaServices};
use fabrik_runtime::value::{IecType, IecValue};
use fabrik_runtime::engine::EngineHandle;
use smol_str::SmolStr;

/// Block exposing one output port per supported concrete scalar type.
struct AllTypesFb {
    name: SmolStr,
    interface: FbInterfaceSpec,
}

impl AllTypesFb {
    fn new() -> Arc<Self> {
        let data_outputs = IecType::ALL
            .into_iter()
            .skip(1)
            .map(|ty| DataPortSpec {
                name: SmolStr::new(format!("P{}", ty.code())),
                ty,
            })
            .collect();
        Arc::new(Self {
            name: SmolStr::new("TYPES"),
            interface: FbInterfaceSpec {
                event_inputs: vec![SmolStr::new("REQ")],
                event_outputs: Vec::new(),
                data_inputs: Vec::new(),
                data_outputs,
            },
        })
    }
}

impl FunctionBlock for AllTypesFb {
    fn receive_input_event(&self, _port_id: PortId, _engine: &EngineHandle) {}

    fn instance_name(&self) -> &SmolStr {
        &self.name
    }

    fn interface_spec(&self) -> &FbInterfaceSpec {
        &self.interface
    }
}

#[test]
fn update_produces_the_mapped_type_for_every_scalar() {
    let space = Arc::new(SimulatedAddressSpace::new());
    let services: Arc<dyn UaServices> = space.clone();
    let registry = NodeRegistry::new(services, 1);
    let fb = AllTypesFb::new();

    for (port_id, ty) in IecType::ALL.into_iter().skip(1).enumerate() {
        let node = registry
            .variable_node_for(fb.as_ref(), port_id as PortId)
            .expect("variable node");
        let expected = ua_type_for(ty);
        assert_eq!(space.data_type_of(&node), Some(expected), "node type {ty:?}");

        let value = IecValue::default_for(ty).expect("concrete default");
        registry
            .update_node_value(&node, &value)
            .expect("update value");
        let stored = space.value_of(&node).expect("stored value");
        assert_eq!(stored.type_id(), expected, "value tag {ty:?}");
    }
}
