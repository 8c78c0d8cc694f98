//! Integration tests for polymorphic array decoding.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uastack_types::attributes::{MethodAttributes, NodeAttributes, ViewAttributes};
use uastack_types::endpoint::{EndpointDescription, UserTokenPolicy};
use uastack_types::namespace::{NamespaceTable, ServerTable, BASE_NAMESPACE_URI};
use uastack_types::{ExpandedNodeId, NodeId, StructureType, TypeDescriptor, UaError};
use uastack_wire::{DecodedArray, EncoderContext, ExtensionObject, TypeRegistry};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const VENDOR: &str = "urn:acme:sensors";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Sensor {
    tag: String,
}

impl StructureType for Sensor {
    const DESCRIPTOR: TypeDescriptor = TypeDescriptor {
        name: "Sensor",
        namespace_uri: VENDOR,
        data_type: 1000,
        binary_encoding: 1001,
        xml_encoding: 1002,
        supertype: None,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TemperatureSensor {
    tag: String,
    celsius: f64,
}

impl StructureType for TemperatureSensor {
    const DESCRIPTOR: TypeDescriptor = TypeDescriptor {
        name: "TemperatureSensor",
        namespace_uri: VENDOR,
        data_type: 1010,
        binary_encoding: 1011,
        xml_encoding: 1012,
        supertype: Some(1000),
    };
}

fn vendor_context() -> EncoderContext {
    let mut namespaces = NamespaceTable::new();
    namespaces.add(VENDOR).unwrap();
    let registry = TypeRegistry::standard_builder()
        .register::<Sensor>()
        .register::<TemperatureSensor>()
        .build_shared();
    EncoderContext::new(namespaces, ServerTable::default(), registry)
}

fn wrap<T: StructureType>(value: &T, ctx: &EncoderContext) -> Option<ExtensionObject> {
    Some(ExtensionObject::encode(value, ctx).unwrap())
}

// ---------------------------------------------------------------------------
// Narrowing
// ---------------------------------------------------------------------------

#[test]
fn test_homogeneous_batch_is_typed() {
    let ctx = EncoderContext::default_instance();
    let values = vec![
        wrap(&UserTokenPolicy::anonymous(), ctx),
        wrap(&UserTokenPolicy::secure_username_password(), ctx),
        wrap(&UserTokenPolicy::secure_certificate(), ctx),
    ];
    let result = ctx.decode_array(&values).unwrap();
    assert!(result.is_typed());
    assert_eq!(result.element_type(), Some(UserTokenPolicy::DESCRIPTOR));
    assert_eq!(result.len(), 3);

    let typed = result.into_typed::<UserTokenPolicy>().unwrap();
    assert_eq!(typed[0], Some(UserTokenPolicy::anonymous()));
    assert_eq!(typed[2], Some(UserTokenPolicy::secure_certificate()));
}

#[test]
fn test_unrelated_types_fall_back_to_general() {
    let ctx = EncoderContext::default_instance();
    let values = vec![
        wrap(&UserTokenPolicy::anonymous(), ctx),
        wrap(&EndpointDescription::default(), ctx),
    ];
    let result = ctx.decode_array(&values).unwrap();
    assert!(matches!(result, DecodedArray::General(_)));
    assert_eq!(result.len(), 2);
    assert!(result.get(0).unwrap().is::<UserTokenPolicy>());
    assert!(result.get(1).unwrap().is::<EndpointDescription>());
}

#[test]
fn test_all_null_batch_is_general_of_same_length() {
    let ctx = EncoderContext::default_instance();
    let values: Vec<Option<ExtensionObject>> = (0..4).map(|_| None).collect();
    let result = ctx.decode_array(&values).unwrap();
    assert!(!result.is_typed());
    assert_eq!(result.len(), 4);
    assert!(result.items().iter().all(Option::is_none));
}

#[test]
fn test_empty_envelopes_count_as_null() {
    let ctx = EncoderContext::default_instance();
    let values = vec![
        Some(ExtensionObject::empty(ExpandedNodeId::ns0(1))),
        None,
    ];
    let result = ctx.decode_array(&values).unwrap();
    assert!(!result.is_typed());
    assert_eq!(result.len(), 2);
}

#[test]
fn test_nulls_do_not_prevent_typing() {
    let ctx = EncoderContext::default_instance();
    let values = vec![None, wrap(&NodeAttributes::named("a"), ctx), None];
    let result = ctx.decode_array(&values).unwrap();
    assert_eq!(result.element_type(), Some(NodeAttributes::DESCRIPTOR));
    assert!(result.get(0).is_none());
    assert!(result.get(1).is_some());
}

#[test]
fn test_siblings_of_one_base_are_unrelated() {
    let ctx = EncoderContext::default_instance();
    let values = vec![
        wrap(&ViewAttributes::default(), ctx),
        wrap(&MethodAttributes::default(), ctx),
    ];
    let result = ctx.decode_array(&values).unwrap();
    assert!(!result.is_typed());
}

#[test]
fn test_base_then_subtype_is_general() {
    let ctx = EncoderContext::default_instance();
    for values in [
        vec![
            wrap(&NodeAttributes::named("base"), ctx),
            wrap(&ViewAttributes::default(), ctx),
        ],
        vec![
            wrap(&ViewAttributes::default(), ctx),
            wrap(&NodeAttributes::named("base"), ctx),
        ],
    ] {
        let result = ctx.decode_array(&values).unwrap();
        assert!(!result.is_typed(), "mixed base and subtype must not be typed");
        assert_eq!(result.len(), 2);
    }
}

#[test]
fn test_vendor_subtypes_are_typed() {
    let ctx = vendor_context();
    let values = vec![
        wrap(&TemperatureSensor { tag: "t1".into(), celsius: 21.5 }, &ctx),
        wrap(&TemperatureSensor { tag: "t2".into(), celsius: 19.0 }, &ctx),
    ];
    let result = ctx.decode_array(&values).unwrap();
    assert_eq!(result.element_type(), Some(TemperatureSensor::DESCRIPTOR));
    let typed = result.into_typed::<TemperatureSensor>().unwrap();
    assert_eq!(typed[1].as_ref().unwrap().tag, "t2");

    let mixed = vec![
        wrap(&Sensor { tag: "s".into() }, &ctx),
        wrap(&TemperatureSensor { tag: "t".into(), celsius: 0.0 }, &ctx),
    ];
    let result = ctx.decode_array(&mixed).unwrap();
    assert!(!result.is_typed());
    let back = result.into_typed::<Sensor>().unwrap_err();
    assert_eq!(back.len(), 2);
}

// ---------------------------------------------------------------------------
// Per-element anomalies and failures
// ---------------------------------------------------------------------------

#[test]
fn test_unknown_type_becomes_null_entry() {
    let ctx = EncoderContext::default_instance();
    let values = vec![
        wrap(&UserTokenPolicy::anonymous(), ctx),
        Some(ExtensionObject::from_encoded(
            ExpandedNodeId::ns0(987_654),
            b"{}".to_vec(),
        )),
        wrap(&UserTokenPolicy::secure_certificate(), ctx),
    ];
    let result = ctx.decode_array(&values).unwrap();
    assert_eq!(result.element_type(), Some(UserTokenPolicy::DESCRIPTOR));
    assert!(result.get(1).is_none());
    assert_eq!(result.len(), 3);
}

#[test]
fn test_malformed_body_becomes_null_entry() {
    let ctx = EncoderContext::default_instance();
    let type_id = ExpandedNodeId::ns0(UserTokenPolicy::DESCRIPTOR.binary_encoding);
    let values = vec![
        Some(ExtensionObject::from_encoded(type_id, b"not json".to_vec())),
        wrap(&UserTokenPolicy::anonymous(), ctx),
    ];
    let result = ctx.decode_array(&values).unwrap();
    assert!(result.is_typed());
    assert!(result.get(0).is_none());
}

#[test]
fn test_unresolved_namespace_fails_the_batch() {
    let ctx = EncoderContext::default_instance();
    let values = vec![
        wrap(&UserTokenPolicy::anonymous(), ctx),
        Some(ExtensionObject::from_encoded(
            NodeId::numeric(5, 1).into(),
            b"{}".to_vec(),
        )),
    ];
    assert!(matches!(
        ctx.decode_array(&values),
        Err(UaError::UnresolvedNamespace(_))
    ));
}

#[test]
fn test_sender_namespace_table_resolves_indices() {
    let ctx = vendor_context();
    let body = serde_json::to_vec(&Sensor { tag: "remote".into() }).unwrap();
    // The sender put the vendor namespace at index 2.
    let type_id: ExpandedNodeId = NodeId::numeric(2, Sensor::DESCRIPTOR.binary_encoding).into();
    let values = vec![Some(ExtensionObject::from_encoded(type_id, body))];

    assert!(matches!(
        ctx.decode_array(&values),
        Err(UaError::UnresolvedNamespace(_))
    ));

    let sender = NamespaceTable::from_uris([BASE_NAMESPACE_URI, "urn:other", VENDOR]).unwrap();
    let result = ctx.decode_array_with(&values, Some(&sender)).unwrap();
    let typed = result.into_typed::<Sensor>().unwrap();
    assert_eq!(typed[0].as_ref().unwrap().tag, "remote");
}

#[test]
fn test_decoding_is_shareable_across_threads() {
    let ctx = Arc::new(vendor_context());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let ctx = Arc::clone(&ctx);
            std::thread::spawn(move || {
                let values = vec![wrap(&Sensor { tag: format!("s{i}") }, &ctx)];
                ctx.decode_array(&values).unwrap().is_typed()
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
