//! Node attribute structures used when adding nodes.
//!
//! [`NodeAttributes`] is the common base; the specialised variants extend it
//! and name it as their supertype.

use serde::{Deserialize, Serialize};

use crate::identifiers as id;
use crate::locale::LocalizedText;
use crate::structure::base_structure;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeAttributes {
    /// Bit mask of the attributes that are set.
    pub specified_attributes: u32,
    pub display_name: LocalizedText,
    pub description: LocalizedText,
    pub write_mask: u32,
    pub user_write_mask: u32,
}

impl NodeAttributes {
    pub fn named(display_name: impl Into<String>) -> Self {
        Self {
            display_name: LocalizedText::invariant(display_name),
            ..Default::default()
        }
    }
}

base_structure!(
    NodeAttributes,
    id::NODE_ATTRIBUTES,
    id::NODE_ATTRIBUTES_ENCODING_BINARY,
    id::NODE_ATTRIBUTES_ENCODING_XML
);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewAttributes {
    #[serde(flatten)]
    pub base: NodeAttributes,
    #[serde(default)]
    pub contains_no_loops: bool,
    #[serde(default)]
    pub event_notifier: u8,
}

base_structure!(
    ViewAttributes,
    id::VIEW_ATTRIBUTES,
    id::VIEW_ATTRIBUTES_ENCODING_BINARY,
    id::VIEW_ATTRIBUTES_ENCODING_XML,
    Some(id::NODE_ATTRIBUTES)
);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodAttributes {
    #[serde(flatten)]
    pub base: NodeAttributes,
    #[serde(default)]
    pub executable: bool,
    #[serde(default)]
    pub user_executable: bool,
}

base_structure!(
    MethodAttributes,
    id::METHOD_ATTRIBUTES,
    id::METHOD_ATTRIBUTES_ENCODING_BINARY,
    id::METHOD_ATTRIBUTES_ENCODING_XML,
    Some(id::NODE_ATTRIBUTES)
);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceTypeAttributes {
    #[serde(flatten)]
    pub base: NodeAttributes,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub symmetric: bool,
    #[serde(default)]
    pub inverse_name: LocalizedText,
}

base_structure!(
    ReferenceTypeAttributes,
    id::REFERENCE_TYPE_ATTRIBUTES,
    id::REFERENCE_TYPE_ATTRIBUTES_ENCODING_BINARY,
    id::REFERENCE_TYPE_ATTRIBUTES_ENCODING_XML,
    Some(id::NODE_ATTRIBUTES)
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::StructureType;

    #[test]
    fn test_subtypes_name_node_attributes() {
        for supertype in [
            ViewAttributes::DESCRIPTOR.supertype,
            MethodAttributes::DESCRIPTOR.supertype,
            ReferenceTypeAttributes::DESCRIPTOR.supertype,
        ] {
            assert_eq!(supertype, Some(NodeAttributes::DESCRIPTOR.data_type));
        }
        assert_eq!(NodeAttributes::DESCRIPTOR.supertype, None);
    }

    #[test]
    fn test_flattened_json_shape() {
        let view = ViewAttributes {
            base: NodeAttributes::named("Plant"),
            contains_no_loops: true,
            event_notifier: 1,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["display_name"]["text"], "Plant");
        assert_eq!(json["contains_no_loops"], true);
        let back: ViewAttributes = serde_json::from_value(json).unwrap();
        assert_eq!(back, view);
    }
}
