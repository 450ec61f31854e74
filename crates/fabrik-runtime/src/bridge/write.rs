//! Client-write dispatch into the event chain.

use std::sync::Arc;

use tracing::debug;

use crate::engine::EngineHandle;
use crate::error::RuntimeError;
use crate::fb::{ComResponse, CommLayer};
use crate::ua::{UaNodeId, UaServices, UaVariant, WriteCallback};
use crate::value::{IecType, IecValue};

use super::typemap;

/// Install a write binding on a variable node.
///
/// Client writes are forwarded to the communication layer; unless the layer
/// answers [`ComResponse::Nothing`], a new event chain is started on its
/// function block. Index ranges are not forwarded; multidimensional writes
/// are not supported.
pub(super) fn register_write_binding(
    services: &Arc<dyn UaServices>,
    node: &UaNodeId,
    layer: Arc<dyn CommLayer>,
    engine: EngineHandle,
) -> Result<(), RuntimeError> {
    let callback: WriteCallback = Arc::new(move |_node, value| on_write(&layer, &engine, value));
    services
        .set_write_callback(node, callback)
        .map_err(RuntimeError::Service)
}

fn on_write(layer: &Arc<dyn CommLayer>, engine: &EngineHandle, value: &UaVariant) {
    let response = layer.recv_data(value);
    if response == ComResponse::Nothing {
        return;
    }
    debug!(?response, "client write accepted, starting event chain");
    engine.start_event_chain(layer.comm_fb());
}

/// Read a client-supplied variant back into an IEC value of the expected
/// type. Mismatched type tags are rejected, never coerced.
pub fn read_back_data_point(
    value: &UaVariant,
    expected: IecType,
) -> Result<IecValue, RuntimeError> {
    typemap::iec_value_from(value, expected)
}
