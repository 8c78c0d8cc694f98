//! Encoder context: the tables and limits encoding and decoding run against.

use std::sync::{Arc, OnceLock};

use uastack_types::endpoint::EndpointConfiguration;
use uastack_types::namespace::{NamespaceTable, ServerTable};
use uastack_types::structure::EncodeType;
use uastack_types::{ExpandedNodeId, NodeId, QualifiedId, TypeDescriptor, UaError, UaResult};

use crate::decode::{decode_array, DecodedArray};
use crate::extension::ExtensionObject;
use crate::registry::TypeRegistry;

/// Namespace and server tables, the type registry and size limits.
///
/// Passed explicitly wherever values are encoded or decoded. A process-wide
/// default built from the standard registry is available through
/// [`EncoderContext::default_instance`]; it is created on first use and
/// never mutated.
#[derive(Debug, Clone)]
pub struct EncoderContext {
    namespaces: NamespaceTable,
    servers: ServerTable,
    registry: Arc<TypeRegistry>,
    pub max_message_size: u32,
    pub max_string_length: u32,
    pub max_byte_string_length: u32,
    pub max_array_length: u32,
}

impl EncoderContext {
    pub fn new(namespaces: NamespaceTable, servers: ServerTable, registry: Arc<TypeRegistry>) -> Self {
        let limits = EndpointConfiguration::defaults();
        Self {
            namespaces,
            servers,
            registry,
            max_message_size: limits.max_message_size,
            max_string_length: limits.max_string_length,
            max_byte_string_length: limits.max_byte_string_length,
            max_array_length: limits.max_array_length,
        }
    }

    pub fn with_limits(mut self, limits: &EndpointConfiguration) -> Self {
        self.max_message_size = limits.max_message_size;
        self.max_string_length = limits.max_string_length;
        self.max_byte_string_length = limits.max_byte_string_length;
        self.max_array_length = limits.max_array_length;
        self
    }

    /// Shared default: base namespace only, standard registry, default limits.
    pub fn default_instance() -> &'static EncoderContext {
        static DEFAULT: OnceLock<EncoderContext> = OnceLock::new();
        DEFAULT.get_or_init(|| {
            EncoderContext::new(
                NamespaceTable::new(),
                ServerTable::default(),
                Arc::new(TypeRegistry::standard()),
            )
        })
    }

    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }

    pub fn namespaces_mut(&mut self) -> &mut NamespaceTable {
        &mut self.namespaces
    }

    pub fn servers(&self) -> &ServerTable {
        &self.servers
    }

    pub fn servers_mut(&mut self) -> &mut ServerTable {
        &mut self.servers
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn set_registry(&mut self, registry: Arc<TypeRegistry>) {
        self.registry = registry;
    }

    /// The local node id a value of `descriptor` is tagged with for `encoding`.
    pub fn encodeable_node_id(
        &self,
        descriptor: &TypeDescriptor,
        encoding: EncodeType,
    ) -> UaResult<NodeId> {
        let id = descriptor.encoding_id(encoding);
        self.namespaces.node_id(&id.namespace_uri, id.identifier)
    }

    /// The portable id a value of `descriptor` is tagged with for `encoding`.
    pub fn encodeable_expanded_id(
        &self,
        descriptor: &TypeDescriptor,
        encoding: EncodeType,
    ) -> ExpandedNodeId {
        let id = descriptor.encoding_id(encoding);
        let mut expanded = ExpandedNodeId::with_uri(id.namespace_uri, id.identifier);
        if let Some(index) = self.namespaces.index_of(descriptor.namespace_uri) {
            expanded.namespace_index = index;
        }
        expanded
    }

    /// The registered type a local data type or encoding id refers to.
    pub fn encodeable_type(&self, id: &NodeId) -> Option<TypeDescriptor> {
        let uri = self.namespaces.uri(id.namespace_index)?;
        let qualified = QualifiedId::new(uri, id.identifier.clone());
        self.registry.descriptor(&qualified)
    }

    /// Resolve a portable id against this context's namespace table.
    pub fn to_node_id(&self, id: &ExpandedNodeId) -> UaResult<NodeId> {
        self.namespaces
            .to_node_id(id)
            .map_err(|_| UaError::Encoding("Could not get namespace index for given id".into()))
    }

    /// Decode an envelope array using this context's namespace table.
    pub fn decode_array(&self, values: &[Option<ExtensionObject>]) -> UaResult<DecodedArray> {
        self.decode_array_with(values, None)
    }

    /// Decode an envelope array, resolving type ids against `namespaces`
    /// instead of this context's table when given.
    pub fn decode_array_with(
        &self,
        values: &[Option<ExtensionObject>],
        namespaces: Option<&NamespaceTable>,
    ) -> UaResult<DecodedArray> {
        if values.len() > self.max_array_length as usize {
            return Err(UaError::Decoding(format!(
                "array of {} elements exceeds limit of {}",
                values.len(),
                self.max_array_length
            )));
        }
        decode_array(values, self, namespaces)
    }
}
