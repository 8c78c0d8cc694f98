//! The contract every encodeable structure satisfies.
//!
//! A concrete structure implements [`StructureType`], which carries a static
//! [`TypeDescriptor`]: its data type id, one id per encoding, and the data
//! type id of its supertype. The object-safe [`Structure`] trait is
//! implemented for every `StructureType` and is what heterogeneous
//! containers (decoded payloads, typed arrays) hold.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::fmt;

use crate::namespace::BASE_NAMESPACE_URI;
use crate::node_id::QualifiedId;

/// Which encoding an id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodeType {
    Binary,
    Xml,
}

/// Static identity of a structure type.
///
/// All ids live in `namespace_uri`, including the supertype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    pub name: &'static str,
    pub namespace_uri: &'static str,
    pub data_type: u32,
    pub binary_encoding: u32,
    pub xml_encoding: u32,
    pub supertype: Option<u32>,
}

impl TypeDescriptor {
    /// A descriptor in the base namespace.
    pub const fn base(
        name: &'static str,
        data_type: u32,
        binary_encoding: u32,
        xml_encoding: u32,
        supertype: Option<u32>,
    ) -> Self {
        Self {
            name,
            namespace_uri: BASE_NAMESPACE_URI,
            data_type,
            binary_encoding,
            xml_encoding,
            supertype,
        }
    }

    pub fn data_type_id(&self) -> QualifiedId {
        QualifiedId::numeric(self.namespace_uri, self.data_type)
    }

    pub fn encoding_id(&self, encoding: EncodeType) -> QualifiedId {
        let id = match encoding {
            EncodeType::Binary => self.binary_encoding,
            EncodeType::Xml => self.xml_encoding,
        };
        QualifiedId::numeric(self.namespace_uri, id)
    }

    pub fn supertype_id(&self) -> Option<QualifiedId> {
        self.supertype
            .map(|id| QualifiedId::numeric(self.namespace_uri, id))
    }
}

/// Implemented by every concrete structure.
pub trait StructureType:
    fmt::Debug + Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const DESCRIPTOR: TypeDescriptor;
}

/// Object-safe view of a structure.
pub trait Structure: fmt::Debug + Send + Sync + 'static {
    fn descriptor(&self) -> TypeDescriptor;

    fn clone_boxed(&self) -> Box<dyn Structure>;

    /// Structural equality; values of different types are never equal.
    fn structure_eq(&self, other: &dyn Structure) -> bool;

    fn to_json(&self) -> serde_json::Result<serde_json::Value>;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: StructureType> Structure for T {
    fn descriptor(&self) -> TypeDescriptor {
        T::DESCRIPTOR
    }

    fn clone_boxed(&self) -> Box<dyn Structure> {
        Box::new(self.clone())
    }

    fn structure_eq(&self, other: &dyn Structure) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| other == self)
    }

    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl dyn Structure {
    pub fn is<T: StructureType>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: StructureType>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Take the concrete value out of the box, or `None` if it is another type.
    pub fn downcast<T: StructureType>(self: Box<Self>) -> Option<T> {
        self.into_any().downcast::<T>().ok().map(|b| *b)
    }
}

impl Clone for Box<dyn Structure> {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

impl PartialEq for dyn Structure {
    fn eq(&self, other: &Self) -> bool {
        self.structure_eq(other)
    }
}

/// Implements [`StructureType`] for a type in the base namespace.
macro_rules! base_structure {
    ($ty:ident, $data:expr, $binary:expr, $xml:expr) => {
        base_structure!($ty, $data, $binary, $xml, None);
    };
    ($ty:ident, $data:expr, $binary:expr, $xml:expr, $supertype:expr) => {
        impl $crate::structure::StructureType for $ty {
            const DESCRIPTOR: $crate::structure::TypeDescriptor =
                $crate::structure::TypeDescriptor::base(
                    stringify!($ty),
                    $data,
                    $binary,
                    $xml,
                    $supertype,
                );
        }
    };
}

pub(crate) use base_structure;
