//! Runtime errors.

#![allow(missing_docs)]

use smol_str::SmolStr;
use thiserror::Error;

use crate::ua::UaStatus;

/// Errors surfaced by the engine and the OPC UA bridge.
///
/// Errors are local: they are returned to the immediate caller and never
/// unwind the dispatcher thread.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Browse path is syntactically invalid.
    #[error("malformed browse path '{0}'")]
    PathMalformed(SmolStr),

    /// Browse path does not start at the Objects folder.
    #[error("browse path '{0}' has to start with '/Objects'")]
    PathNotRooted(SmolStr),

    /// No node exists for the given path or identifier.
    #[error("node not found '{0}'")]
    NodeNotFound(SmolStr),

    /// The OPC UA stack returned a non-good status code.
    #[error("opc ua service error {0}")]
    Service(UaStatus),

    /// IEC type code outside the supported scalar set.
    #[error("unsupported iec type code {0}")]
    UnsupportedType(u16),

    /// Stored node type and supplied value type disagree.
    #[error("type mismatch")]
    TypeMismatch,

    /// Data port ordinal outside the FB interface.
    #[error("invalid port id {0}")]
    InvalidPortId(u16),

    /// Node identifier text form is invalid.
    #[error("invalid node id '{0}'")]
    InvalidNodeId(SmolStr),

    /// Thread spawn error.
    #[error("thread spawn error '{0}'")]
    ThreadSpawn(SmolStr),

    /// Configuration error.
    #[error("invalid config '{0}'")]
    InvalidConfig(SmolStr),
}
