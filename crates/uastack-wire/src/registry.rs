//! TypeRegistry: the structure types a decoder knows about.
//!
//! Each registered type is reachable by its data type id and by both of its
//! encoding ids. The supertype relation is computed once at build time so
//! that subtype checks during decoding are plain set lookups.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use uastack_types::attributes::{
    MethodAttributes, NodeAttributes, ReferenceTypeAttributes, ViewAttributes,
};
use uastack_types::discovery::{
    BrowseDescription, DiscoveryConfiguration, GetEndpointsRequest, GetEndpointsResponse,
    MdnsDiscoveryConfiguration, RequestHeader, ResponseHeader,
};
use uastack_types::endpoint::{
    ApplicationDescription, EndpointConfiguration, EndpointDescription, SignedSoftwareCertificate,
    UserTokenPolicy,
};
use uastack_types::structure::EncodeType;
use uastack_types::{QualifiedId, Structure, StructureType, TypeDescriptor, UaError, UaResult};

type DecodeFn = fn(&[u8]) -> UaResult<Box<dyn Structure>>;

fn decode_as<T: StructureType>(body: &[u8]) -> UaResult<Box<dyn Structure>> {
    serde_json::from_slice::<T>(body)
        .map(|value| Box::new(value) as Box<dyn Structure>)
        .map_err(|e| UaError::Decoding(format!("{}: {e}", T::DESCRIPTOR.name)))
}

/// A registered type: its descriptor and how to decode its body.
#[derive(Clone, Copy)]
pub struct TypeEntry {
    descriptor: TypeDescriptor,
    decode: DecodeFn,
}

impl TypeEntry {
    pub fn descriptor(&self) -> TypeDescriptor {
        self.descriptor
    }

    pub fn decode(&self, body: &[u8]) -> UaResult<Box<dyn Structure>> {
        (self.decode)(body)
    }
}

impl fmt::Debug for TypeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeEntry").field(&self.descriptor.name).finish()
    }
}

#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<QualifiedId, TypeEntry>,
    /// Binary and XML encoding id → data type id.
    encodings: HashMap<QualifiedId, QualifiedId>,
    /// Data type id → all strict ancestors.
    ancestors: HashMap<QualifiedId, HashSet<QualifiedId>>,
}

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    /// The structures defined in the base namespace.
    pub fn standard() -> Self {
        Self::standard_builder().build()
    }

    /// A builder pre-loaded with the base namespace structures, for adding
    /// vendor types on top.
    pub fn standard_builder() -> TypeRegistryBuilder {
        Self::builder()
            .register::<NodeAttributes>()
            .register::<ViewAttributes>()
            .register::<MethodAttributes>()
            .register::<ReferenceTypeAttributes>()
            .register::<UserTokenPolicy>()
            .register::<ApplicationDescription>()
            .register::<EndpointDescription>()
            .register::<EndpointConfiguration>()
            .register::<SignedSoftwareCertificate>()
            .register::<RequestHeader>()
            .register::<ResponseHeader>()
            .register::<GetEndpointsRequest>()
            .register::<GetEndpointsResponse>()
            .register::<BrowseDescription>()
            .register::<DiscoveryConfiguration>()
            .register::<MdnsDiscoveryConfiguration>()
    }

    /// Look up a type by data type id or either encoding id.
    pub fn lookup(&self, id: &QualifiedId) -> Option<&TypeEntry> {
        self.types
            .get(id)
            .or_else(|| self.encodings.get(id).and_then(|data| self.types.get(data)))
    }

    pub fn descriptor(&self, id: &QualifiedId) -> Option<TypeDescriptor> {
        self.lookup(id).map(TypeEntry::descriptor)
    }

    /// True when `supertype` is a strict ancestor of `subtype`.
    pub fn is_supertype_of(&self, supertype: &TypeDescriptor, subtype: &TypeDescriptor) -> bool {
        self.ancestors
            .get(&subtype.data_type_id())
            .map_or(false, |set| set.contains(&supertype.data_type_id()))
    }

    /// True when `value_type` is `target` or one of its subtypes.
    pub fn is_a(&self, value_type: &TypeDescriptor, target: &TypeDescriptor) -> bool {
        value_type == target || self.is_supertype_of(target, value_type)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = TypeDescriptor> + '_ {
        self.types.values().map(TypeEntry::descriptor)
    }
}

/// Collects types, then computes the lookup maps in [`build`](Self::build).
#[derive(Default)]
pub struct TypeRegistryBuilder {
    entries: Vec<TypeEntry>,
}

impl TypeRegistryBuilder {
    pub fn register<T: StructureType>(mut self) -> Self {
        self.entries.push(TypeEntry {
            descriptor: T::DESCRIPTOR,
            decode: decode_as::<T>,
        });
        self
    }

    pub fn build(self) -> TypeRegistry {
        let mut types = HashMap::with_capacity(self.entries.len());
        let mut encodings = HashMap::with_capacity(self.entries.len() * 2);
        for entry in self.entries {
            let d = entry.descriptor;
            let data = d.data_type_id();
            encodings.insert(d.encoding_id(EncodeType::Binary), data.clone());
            encodings.insert(d.encoding_id(EncodeType::Xml), data.clone());
            if types.insert(data.clone(), entry).is_some() {
                warn!(type_id = %data, name = d.name, "Type registered twice, keeping the last");
            }
        }

        let mut ancestors = HashMap::with_capacity(types.len());
        for (id, entry) in &types {
            let mut chain = HashSet::new();
            let mut next = entry.descriptor.supertype_id();
            while let Some(parent) = next {
                if !chain.insert(parent.clone()) || parent == *id {
                    warn!(type_id = %id, "Cycle in supertype chain");
                    break;
                }
                next = types
                    .get(&parent)
                    .and_then(|p: &TypeEntry| p.descriptor.supertype_id());
            }
            ancestors.insert(id.clone(), chain);
        }

        TypeRegistry {
            types,
            encodings,
            ancestors,
        }
    }

    pub fn build_shared(self) -> Arc<TypeRegistry> {
        Arc::new(self.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uastack_types::identifiers as id;
    use uastack_types::namespace::BASE_NAMESPACE_URI;

    #[test]
    fn test_lookup_by_any_id() {
        let registry = TypeRegistry::standard();
        for raw in [
            id::ENDPOINT_DESCRIPTION,
            id::ENDPOINT_DESCRIPTION_ENCODING_BINARY,
            id::ENDPOINT_DESCRIPTION_ENCODING_XML,
        ] {
            let found = registry
                .descriptor(&QualifiedId::numeric(BASE_NAMESPACE_URI, raw))
                .unwrap();
            assert_eq!(found.name, "EndpointDescription");
        }
        assert!(registry
            .lookup(&QualifiedId::numeric("urn:other", id::ENDPOINT_DESCRIPTION))
            .is_none());
    }

    #[test]
    fn test_supertype_relation() {
        let registry = TypeRegistry::standard();
        let node = NodeAttributes::DESCRIPTOR;
        let view = ViewAttributes::DESCRIPTOR;
        let method = MethodAttributes::DESCRIPTOR;

        assert!(registry.is_supertype_of(&node, &view));
        assert!(!registry.is_supertype_of(&view, &node));
        assert!(!registry.is_supertype_of(&node, &node));
        assert!(!registry.is_supertype_of(&view, &method));
        assert!(registry.is_a(&view, &node));
        assert!(registry.is_a(&node, &node));
        assert!(!registry.is_a(&node, &view));
    }

    #[test]
    fn test_decode_entry() {
        let registry = TypeRegistry::standard();
        let entry = registry
            .lookup(&UserTokenPolicy::DESCRIPTOR.data_type_id())
            .unwrap();
        let body = serde_json::to_vec(&UserTokenPolicy::anonymous()).unwrap();
        let value = entry.decode(&body).unwrap();
        assert_eq!(
            value.downcast_ref::<UserTokenPolicy>(),
            Some(&UserTokenPolicy::anonymous())
        );
        assert!(matches!(entry.decode(b"{"), Err(UaError::Decoding(_))));
    }
}
