//! Namespace and server tables.
//!
//! A [`NamespaceTable`] maps compact namespace indices to URIs so that a
//! local [`NodeId`] can be turned into a portable [`ExpandedNodeId`] and
//! back. Index 0 is always the base namespace of the stack. The parallel
//! [`ServerTable`] does the same for server URIs; index 0 is the local server.

use serde::{Deserialize, Serialize};

use crate::error::{UaError, UaResult};
use crate::node_id::{ExpandedNodeId, Identifier, NodeId, QualifiedId};

/// URI of the base namespace, always at index 0.
pub const BASE_NAMESPACE_URI: &str = "http://opcfoundation.org/UA/";

/// Index → namespace URI table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct NamespaceTable {
    uris: Vec<String>,
}

impl NamespaceTable {
    /// A table holding only the base namespace.
    pub fn new() -> Self {
        Self {
            uris: vec![BASE_NAMESPACE_URI.to_string()],
        }
    }

    /// Build a table from a URI list. The base namespace is placed at index 0
    /// if the list does not already start with it.
    pub fn from_uris<I, S>(uris: I) -> UaResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for uri in uris {
            let uri = uri.into();
            if uri == BASE_NAMESPACE_URI && table.uris.len() == 1 {
                continue;
            }
            table.push(uri)?;
        }
        Ok(table)
    }

    /// Register a namespace, returning its index. Existing URIs keep their index.
    pub fn add(&mut self, uri: impl Into<String>) -> UaResult<u16> {
        let uri = uri.into();
        if let Some(index) = self.index_of(&uri) {
            return Ok(index);
        }
        self.push(uri)
    }

    fn push(&mut self, uri: String) -> UaResult<u16> {
        let index = u16::try_from(self.uris.len()).map_err(|_| {
            UaError::UnexpectedConfiguration(format!("namespace table full, cannot add {uri}"))
        })?;
        self.uris.push(uri);
        Ok(index)
    }

    pub fn index_of(&self, uri: &str) -> Option<u16> {
        self.uris
            .iter()
            .position(|u| u == uri)
            .and_then(|i| u16::try_from(i).ok())
    }

    pub fn uri(&self, index: u16) -> Option<&str> {
        self.uris.get(usize::from(index)).map(String::as_str)
    }

    pub fn uris(&self) -> &[String] {
        &self.uris
    }

    pub fn len(&self) -> usize {
        self.uris.len()
    }

    /// Never true: the base namespace is always present.
    pub fn is_empty(&self) -> bool {
        self.uris.is_empty()
    }

    /// Resolve a (namespace URI, identifier) pair to a local node id.
    pub fn node_id(&self, namespace_uri: &str, identifier: Identifier) -> UaResult<NodeId> {
        let index = self.index_of(namespace_uri).ok_or_else(|| {
            UaError::UnresolvedNamespace(format!("namespace {namespace_uri} is not in the table"))
        })?;
        Ok(NodeId::new(index, identifier))
    }

    /// Turn a local node id into a portable one carrying its namespace URI.
    pub fn to_expanded_node_id(&self, id: &NodeId) -> UaResult<ExpandedNodeId> {
        let uri = self.uri(id.namespace_index).ok_or_else(|| {
            UaError::UnresolvedNamespace(format!(
                "namespace index {} of {id} is not in the table",
                id.namespace_index
            ))
        })?;
        Ok(ExpandedNodeId {
            namespace_uri: Some(uri.to_string()),
            namespace_index: id.namespace_index,
            identifier: id.identifier.clone(),
            server_index: 0,
        })
    }

    /// Turn a portable node id into a local one. Fails for ids that name a
    /// remote server or a namespace missing from this table.
    pub fn to_node_id(&self, id: &ExpandedNodeId) -> UaResult<NodeId> {
        if !id.is_local() {
            return Err(UaError::UnresolvedNamespace(format!(
                "{id} refers to remote server {}",
                id.server_index
            )));
        }
        match &id.namespace_uri {
            Some(uri) => self.node_id(uri, id.identifier.clone()),
            None => {
                if self.uri(id.namespace_index).is_none() {
                    return Err(UaError::UnresolvedNamespace(format!(
                        "namespace index {} of {id} is not in the table",
                        id.namespace_index
                    )));
                }
                Ok(NodeId::new(id.namespace_index, id.identifier.clone()))
            }
        }
    }

    /// The table-independent form of an expanded node id.
    pub fn qualify(&self, id: &ExpandedNodeId) -> UaResult<QualifiedId> {
        let uri = match &id.namespace_uri {
            Some(uri) => uri.clone(),
            None => self
                .uri(id.namespace_index)
                .ok_or_else(|| {
                    UaError::UnresolvedNamespace(format!(
                        "namespace index {} of {id} is not in the table",
                        id.namespace_index
                    ))
                })?
                .to_string(),
        };
        Ok(QualifiedId::new(uri, id.identifier.clone()))
    }
}

impl Default for NamespaceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<Vec<String>> for NamespaceTable {
    type Error = UaError;

    fn try_from(uris: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_uris(uris)
    }
}

impl From<NamespaceTable> for Vec<String> {
    fn from(table: NamespaceTable) -> Self {
        table.uris
    }
}

/// Index → server URI table. Index 0 is the local server's application URI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerTable {
    uris: Vec<String>,
}

impl ServerTable {
    pub fn new(local_application_uri: impl Into<String>) -> Self {
        Self {
            uris: vec![local_application_uri.into()],
        }
    }

    /// Replace the local server URI at index 0.
    pub fn set_local(&mut self, uri: impl Into<String>) {
        let uri = uri.into();
        match self.uris.first_mut() {
            Some(first) => *first = uri,
            None => self.uris.push(uri),
        }
    }

    /// Register a server, returning its index. Existing URIs keep their index.
    pub fn add(&mut self, uri: impl Into<String>) -> UaResult<u32> {
        let uri = uri.into();
        if let Some(index) = self.index_of(&uri) {
            return Ok(index);
        }
        let index = u32::try_from(self.uris.len()).map_err(|_| {
            UaError::UnexpectedConfiguration(format!("server table full, cannot add {uri}"))
        })?;
        self.uris.push(uri);
        Ok(index)
    }

    pub fn index_of(&self, uri: &str) -> Option<u32> {
        self.uris
            .iter()
            .position(|u| u == uri)
            .and_then(|i| u32::try_from(i).ok())
    }

    pub fn uri(&self, index: u32) -> Option<&str> {
        self.uris.get(index as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.uris.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uris.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_namespace_reserved() {
        let table = NamespaceTable::new();
        assert_eq!(table.uri(0), Some(BASE_NAMESPACE_URI));

        let table = NamespaceTable::from_uris(["urn:vendor"]).unwrap();
        assert_eq!(table.uri(0), Some(BASE_NAMESPACE_URI));
        assert_eq!(table.index_of("urn:vendor"), Some(1));

        let table = NamespaceTable::from_uris([BASE_NAMESPACE_URI, "urn:vendor"]).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut table = NamespaceTable::new();
        let a = table.add("urn:a").unwrap();
        let b = table.add("urn:b").unwrap();
        assert_eq!(table.add("urn:a").unwrap(), a);
        assert_eq!((a, b), (1, 2));
    }

    #[test]
    fn test_round_trip_through_expanded() {
        let mut table = NamespaceTable::new();
        table.add("urn:plant").unwrap();
        let local = NodeId::string(1, "Valve");
        let expanded = table.to_expanded_node_id(&local).unwrap();
        assert_eq!(expanded.namespace_uri.as_deref(), Some("urn:plant"));
        assert_eq!(table.to_node_id(&expanded).unwrap(), local);
    }

    #[test]
    fn test_unknown_namespace_is_an_error() {
        let table = NamespaceTable::new();
        let by_uri = ExpandedNodeId::with_uri("urn:missing", Identifier::Numeric(1));
        assert!(matches!(
            table.to_node_id(&by_uri),
            Err(UaError::UnresolvedNamespace(_))
        ));
        let by_index: ExpandedNodeId = NodeId::numeric(4, 1).into();
        assert!(matches!(
            table.qualify(&by_index),
            Err(UaError::UnresolvedNamespace(_))
        ));
        assert!(table.to_expanded_node_id(&NodeId::numeric(9, 1)).is_err());
    }

    #[test]
    fn test_remote_server_id_not_local() {
        let table = NamespaceTable::new();
        let mut id = ExpandedNodeId::ns0(85);
        id.server_index = 3;
        assert!(table.to_node_id(&id).is_err());
    }

    #[test]
    fn test_qualify_ignores_local_index_choice() {
        let mut left = NamespaceTable::new();
        left.add("urn:x").unwrap();
        let mut right = NamespaceTable::new();
        right.add("urn:other").unwrap();
        right.add("urn:x").unwrap();

        let a = left
            .qualify(&NodeId::numeric(1, 10).into())
            .unwrap();
        let b = right
            .qualify(&NodeId::numeric(2, 10).into())
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_server_table() {
        let mut servers = ServerTable::new("urn:local");
        assert_eq!(servers.add("urn:remote").unwrap(), 1);
        assert_eq!(servers.add("urn:remote").unwrap(), 1);
        assert_eq!(servers.add("urn:other").unwrap(), 2);
        assert_eq!(servers.index_of("urn:other"), Some(2));
        assert_eq!(servers.index_of("urn:missing"), None);
        servers.set_local("urn:renamed");
        assert_eq!(servers.uri(0), Some("urn:renamed"));
        assert_eq!(servers.index_of("urn:local"), None);
    }
}
