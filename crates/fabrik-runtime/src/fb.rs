//! Function-block contracts consumed by the engine and the bridge.

use std::fmt;
use std::sync::{Arc, Weak};

use smol_str::SmolStr;

use crate::engine::EngineHandle;
use crate::ua::UaVariant;
use crate::value::IecType;

/// Ordinal of an event or data port on a function-block interface.
pub type PortId = u16;

/// Typed data port on a function-block interface.
#[derive(Debug, Clone)]
pub struct DataPortSpec {
    /// Port name as it appears in the FB type declaration.
    pub name: SmolStr,
    /// Declared scalar type of the port.
    pub ty: IecType,
}

/// Event and data ports of a function block, by position.
#[derive(Debug, Clone, Default)]
pub struct FbInterfaceSpec {
    /// Input event port names.
    pub event_inputs: Vec<SmolStr>,
    /// Output event port names.
    pub event_outputs: Vec<SmolStr>,
    /// Input data ports.
    pub data_inputs: Vec<DataPortSpec>,
    /// Output data ports.
    pub data_outputs: Vec<DataPortSpec>,
}

/// One IEC 61499 function block instance.
///
/// Blocks are owned by the FB graph; the engine and the bridge hold only
/// non-owning references.
pub trait FunctionBlock: Send + Sync {
    /// Deliver one input event.
    ///
    /// Runs synchronously on the dispatcher thread and must not block for
    /// unbounded time. Further events may be chained through `engine`.
    fn receive_input_event(&self, port_id: PortId, engine: &EngineHandle);

    /// Instance name of this block.
    fn instance_name(&self) -> &SmolStr;

    /// Port layout of this block.
    fn interface_spec(&self) -> &FbInterfaceSpec;
}

/// A pending event delivery: one input event port on one function block.
///
/// The block reference is non-owning. An entry whose block has been dropped
/// is skipped by the dispatcher.
#[derive(Clone)]
pub struct EventEntry {
    fb: Weak<dyn FunctionBlock>,
    port_id: PortId,
}

impl EventEntry {
    /// Entry for `port_id` on `fb`.
    pub fn new<F>(fb: &Arc<F>, port_id: PortId) -> Self
    where
        F: FunctionBlock + 'static,
    {
        let fb: Arc<dyn FunctionBlock> = fb.clone();
        let fb: Weak<dyn FunctionBlock> = Arc::downgrade(&fb);
        Self { fb, port_id }
    }

    /// Target input event port.
    #[must_use]
    pub fn port_id(&self) -> PortId {
        self.port_id
    }

    /// The target block, if it is still alive.
    #[must_use]
    pub fn block(&self) -> Option<Arc<dyn FunctionBlock>> {
        self.fb.upgrade()
    }
}

impl fmt::Debug for EventEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.fb.upgrade().map(|fb| fb.instance_name().clone());
        f.debug_struct("EventEntry")
            .field("fb", &name)
            .field("port_id", &self.port_id)
            .finish()
    }
}

/// Status a communication layer reports for received data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComResponse {
    /// No reaction required.
    Nothing,
    /// Initialization data accepted.
    InitOk,
    /// Process data accepted.
    ProcessDataOk,
    /// Process data rejected: wrong type.
    ProcessDataTypeError,
    /// Process data could not be received.
    ProcessDataRecvFailed,
}

/// Communication layer fed by OPC UA client writes.
pub trait CommLayer: Send + Sync {
    /// Accept data arriving from an external client.
    fn recv_data(&self, data: &UaVariant) -> ComResponse;

    /// Event entry that starts a new chain when this layer accepts data.
    fn comm_fb(&self) -> EventEntry;
}
