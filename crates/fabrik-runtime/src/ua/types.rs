//! OPC UA wire-model types used by the bridge.

#![allow(missing_docs)]

use std::fmt;

use smol_str::SmolStr;

use crate::error::RuntimeError;

/// Identifier part of a node id.
///
/// GUID and bytestring identifiers are not used by this core.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UaIdentifier {
    Numeric(u32),
    String(SmolStr),
}

/// OPC UA address-space key: namespace index plus identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UaNodeId {
    pub namespace: u16,
    pub identifier: UaIdentifier,
}

impl UaNodeId {
    /// Numeric node id. Numeric 0 in a request means "assign one".
    #[must_use]
    pub const fn numeric(namespace: u16, identifier: u32) -> Self {
        Self {
            namespace,
            identifier: UaIdentifier::Numeric(identifier),
        }
    }

    /// String node id.
    pub fn string(namespace: u16, identifier: impl Into<SmolStr>) -> Self {
        Self {
            namespace,
            identifier: UaIdentifier::String(identifier.into()),
        }
    }

    /// Parse the `ns:type:identifier` text form, e.g. `1:string:FB1` or
    /// `0:numeric:85`.
    pub fn parse(text: &str) -> Result<Self, RuntimeError> {
        let invalid = || RuntimeError::InvalidNodeId(text.into());
        let mut parts = text.splitn(3, ':');
        let namespace = parts
            .next()
            .and_then(|ns| ns.parse::<u16>().ok())
            .ok_or_else(invalid)?;
        let kind = parts.next().ok_or_else(invalid)?;
        let identifier = parts.next().filter(|id| !id.is_empty()).ok_or_else(invalid)?;
        match kind {
            "numeric" => {
                let id = identifier.parse::<u32>().map_err(|_| invalid())?;
                Ok(Self::numeric(namespace, id))
            }
            "string" => Ok(Self::string(namespace, identifier)),
            // guid and bytestring identifiers are not supported here
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for UaNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.identifier {
            UaIdentifier::Numeric(id) => write!(f, "ns={};i={id}", self.namespace),
            UaIdentifier::String(id) => write!(f, "ns={};s={id}", self.namespace),
        }
    }
}

/// Well-known namespace-0 nodes.
pub mod ns0 {
    use super::UaNodeId;

    /// The `Objects` folder.
    pub const OBJECTS_FOLDER: UaNodeId = UaNodeId::numeric(0, 85);
    /// The `Organizes` reference type.
    pub const ORGANIZES: UaNodeId = UaNodeId::numeric(0, 35);
    /// The `HasComponent` reference type.
    pub const HAS_COMPONENT: UaNodeId = UaNodeId::numeric(0, 47);
    /// The `FolderType` object type.
    pub const FOLDER_TYPE: UaNodeId = UaNodeId::numeric(0, 61);
}

/// Qualified browse name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UaQualifiedName {
    pub namespace: u16,
    pub name: SmolStr,
}

impl UaQualifiedName {
    pub fn new(namespace: u16, name: impl Into<SmolStr>) -> Self {
        Self {
            namespace,
            name: name.into(),
        }
    }
}

impl fmt::Display for UaQualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

/// OPC UA builtin scalar type tags the bridge maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UaTypeId {
    Variant,
    Boolean,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    String,
    DateTime,
}

/// Scalar value travelling between the engine and the server.
///
/// `DateTime` carries milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq)]
pub enum UaVariant {
    Empty,
    Boolean(bool),
    SByte(i8),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(SmolStr),
    DateTime(i64),
}

impl UaVariant {
    /// Builtin type tag of this value.
    #[must_use]
    pub fn type_id(&self) -> UaTypeId {
        match self {
            UaVariant::Empty => UaTypeId::Variant,
            UaVariant::Boolean(_) => UaTypeId::Boolean,
            UaVariant::SByte(_) => UaTypeId::SByte,
            UaVariant::Byte(_) => UaTypeId::Byte,
            UaVariant::Int16(_) => UaTypeId::Int16,
            UaVariant::UInt16(_) => UaTypeId::UInt16,
            UaVariant::Int32(_) => UaTypeId::Int32,
            UaVariant::UInt32(_) => UaTypeId::UInt32,
            UaVariant::Int64(_) => UaTypeId::Int64,
            UaVariant::UInt64(_) => UaTypeId::UInt64,
            UaVariant::Float(_) => UaTypeId::Float,
            UaVariant::Double(_) => UaTypeId::Double,
            UaVariant::String(_) => UaTypeId::String,
            UaVariant::DateTime(_) => UaTypeId::DateTime,
        }
    }
}

/// OPC UA service status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UaStatus(pub u32);

impl UaStatus {
    pub const GOOD: UaStatus = UaStatus(0);
    pub const BAD_INTERNAL_ERROR: UaStatus = UaStatus(0x8002_0000);
    pub const BAD_NODE_ID_UNKNOWN: UaStatus = UaStatus(0x8034_0000);
    pub const BAD_NODE_ID_EXISTS: UaStatus = UaStatus(0x805E_0000);
    pub const BAD_NODE_CLASS_INVALID: UaStatus = UaStatus(0x805F_0000);
    pub const BAD_PARENT_NODE_ID_INVALID: UaStatus = UaStatus(0x805B_0000);
    pub const BAD_NO_MATCH: UaStatus = UaStatus(0x806F_0000);
    pub const BAD_TYPE_MISMATCH: UaStatus = UaStatus(0x8074_0000);

    /// The severity bits signal success.
    #[must_use]
    pub fn is_good(self) -> bool {
        self.0 & 0x8000_0000 == 0
    }
}

impl fmt::Display for UaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// One step of a relative browse path.
#[derive(Debug, Clone)]
pub struct RelativePathElement {
    pub reference_type: UaNodeId,
    pub target_name: UaQualifiedName,
}

/// Browse path rooted at a starting node.
#[derive(Debug, Clone)]
pub struct BrowsePath {
    pub starting_node: UaNodeId,
    pub elements: Vec<RelativePathElement>,
}

/// Per-path outcome of a translate request.
#[derive(Debug, Clone)]
pub struct BrowsePathResult {
    pub status: UaStatus,
    pub targets: Vec<UaNodeId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_text_form_round_trips() {
        let id = UaNodeId::parse("1:string:FB1").expect("string id");
        assert_eq!(id, UaNodeId::string(1, "FB1"));
        assert_eq!(id.to_string(), "ns=1;s=FB1");

        let id = UaNodeId::parse("0:numeric:85").expect("numeric id");
        assert_eq!(id, ns0::OBJECTS_FOLDER);
        assert_eq!(id.to_string(), "ns=0;i=85");
    }

    #[test]
    fn unsupported_identifier_kinds_are_rejected() {
        assert!(UaNodeId::parse("2:guid:deadbeef").is_err());
        assert!(UaNodeId::parse("2:bytestring:Q").is_err());
        assert!(UaNodeId::parse("x:string:Q").is_err());
        assert!(UaNodeId::parse("2:numeric:notanumber").is_err());
        assert!(UaNodeId::parse("2:string:").is_err());
        assert!(UaNodeId::parse("2").is_err());
    }

    #[test]
    fn status_severity_detection() {
        assert!(UaStatus::GOOD.is_good());
        assert!(!UaStatus::BAD_NO_MATCH.is_good());
        assert_eq!(UaStatus::BAD_NODE_ID_UNKNOWN.to_string(), "0x80340000");
    }
}
