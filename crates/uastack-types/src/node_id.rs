//! Node identifiers: local [`NodeId`], portable [`ExpandedNodeId`], and the
//! table-independent [`QualifiedId`] used as a lookup key.
//!
//! Text forms follow the usual notation: `ns=2;s=Pump`, `i=85`,
//! `svr=1;nsu=urn:vendor;g=...`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::UaError;

/// The identifier part of a node id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Identifier {
    Numeric(u32),
    String(String),
    Guid(Uuid),
    Opaque(Vec<u8>),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Numeric(v) => write!(f, "i={v}"),
            Identifier::String(v) => write!(f, "s={v}"),
            Identifier::Guid(v) => write!(f, "g={v}"),
            Identifier::Opaque(v) => write!(f, "b={}", STANDARD.encode(v)),
        }
    }
}

impl FromStr for Identifier {
    type Err = UaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, value) = s
            .split_once('=')
            .ok_or_else(|| UaError::Decoding(format!("malformed identifier '{s}'")))?;
        match kind {
            "i" => value
                .parse()
                .map(Identifier::Numeric)
                .map_err(|e| UaError::Decoding(format!("bad numeric identifier '{value}': {e}"))),
            "s" => Ok(Identifier::String(value.to_string())),
            "g" => Uuid::parse_str(value)
                .map(Identifier::Guid)
                .map_err(|e| UaError::Decoding(format!("bad guid identifier '{value}': {e}"))),
            "b" => STANDARD
                .decode(value)
                .map(Identifier::Opaque)
                .map_err(|e| UaError::Decoding(format!("bad opaque identifier '{value}': {e}"))),
            other => Err(UaError::Decoding(format!(
                "unknown identifier type '{other}'"
            ))),
        }
    }
}

/// A node id that is only meaningful against a specific namespace table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    pub namespace_index: u16,
    pub identifier: Identifier,
}

impl NodeId {
    pub fn new(namespace_index: u16, identifier: Identifier) -> Self {
        Self {
            namespace_index,
            identifier,
        }
    }

    pub fn numeric(namespace_index: u16, value: u32) -> Self {
        Self::new(namespace_index, Identifier::Numeric(value))
    }

    pub fn string(namespace_index: u16, value: impl Into<String>) -> Self {
        Self::new(namespace_index, Identifier::String(value.into()))
    }

    /// The null node id (`i=0`).
    pub fn null() -> Self {
        Self::numeric(0, 0)
    }

    pub fn is_null(&self) -> bool {
        self.namespace_index == 0 && self.identifier == Identifier::Numeric(0)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace_index != 0 {
            write!(f, "ns={};", self.namespace_index)?;
        }
        write!(f, "{}", self.identifier)
    }
}

impl FromStr for NodeId {
    type Err = UaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix("ns=") {
            Some(rest) => {
                let (ns, id) = rest
                    .split_once(';')
                    .ok_or_else(|| UaError::Decoding(format!("malformed node id '{s}'")))?;
                let namespace_index = ns
                    .parse()
                    .map_err(|e| UaError::Decoding(format!("bad namespace index '{ns}': {e}")))?;
                Ok(NodeId::new(namespace_index, id.parse()?))
            }
            None => Ok(NodeId::new(0, s.parse()?)),
        }
    }
}

/// A node id that can carry its namespace by URI and name a remote server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpandedNodeId {
    /// When set, takes precedence over `namespace_index`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_uri: Option<String>,
    #[serde(default)]
    pub namespace_index: u16,
    pub identifier: Identifier,
    /// Index into the server table; 0 is the local server.
    #[serde(default)]
    pub server_index: u32,
}

impl ExpandedNodeId {
    /// A numeric id in the base namespace.
    pub fn ns0(value: u32) -> Self {
        NodeId::numeric(0, value).into()
    }

    /// An id qualified by namespace URI rather than index.
    pub fn with_uri(namespace_uri: impl Into<String>, identifier: Identifier) -> Self {
        Self {
            namespace_uri: Some(namespace_uri.into()),
            namespace_index: 0,
            identifier,
            server_index: 0,
        }
    }

    pub fn is_local(&self) -> bool {
        self.server_index == 0
    }
}

impl From<NodeId> for ExpandedNodeId {
    fn from(id: NodeId) -> Self {
        Self {
            namespace_uri: None,
            namespace_index: id.namespace_index,
            identifier: id.identifier,
            server_index: 0,
        }
    }
}

impl fmt::Display for ExpandedNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.server_index != 0 {
            write!(f, "svr={};", self.server_index)?;
        }
        match &self.namespace_uri {
            Some(uri) => write!(f, "nsu={uri};")?,
            None if self.namespace_index != 0 => write!(f, "ns={};", self.namespace_index)?,
            None => {}
        }
        write!(f, "{}", self.identifier)
    }
}

/// A namespace-qualified identifier that does not depend on any table.
///
/// Used as the key for type lookups: two ids that resolve to the same
/// namespace URI and identifier are the same node, whatever index each
/// side assigned to the namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedId {
    pub namespace_uri: String,
    pub identifier: Identifier,
}

impl QualifiedId {
    pub fn new(namespace_uri: impl Into<String>, identifier: Identifier) -> Self {
        Self {
            namespace_uri: namespace_uri.into(),
            identifier,
        }
    }

    pub fn numeric(namespace_uri: impl Into<String>, value: u32) -> Self {
        Self::new(namespace_uri, Identifier::Numeric(value))
    }
}

impl fmt::Display for QualifiedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "nsu={};{}", self.namespace_uri, self.identifier)
    }
}
