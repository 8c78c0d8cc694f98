//! Polymorphic array decoding.
//!
//! An array of envelopes is decoded element by element and then typed as
//! the narrowest structure type every element is an instance of. Arrays
//! whose elements share no such type come back in the general form.

use tracing::{debug, warn};

use uastack_types::namespace::NamespaceTable;
use uastack_types::{Structure, StructureType, TypeDescriptor, UaError, UaResult};

use crate::context::EncoderContext;
use crate::extension::ExtensionObject;
use crate::registry::TypeRegistry;

pub type DecodedItems = Vec<Option<Box<dyn Structure>>>;

/// Result of [`decode_array`].
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedArray {
    /// Every present element is an instance of `element_type`.
    Typed {
        element_type: TypeDescriptor,
        items: DecodedItems,
    },
    /// No common type: all elements absent, or unrelated types mixed.
    General(DecodedItems),
}

impl DecodedArray {
    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    pub fn is_typed(&self) -> bool {
        matches!(self, DecodedArray::Typed { .. })
    }

    pub fn element_type(&self) -> Option<TypeDescriptor> {
        match self {
            DecodedArray::Typed { element_type, .. } => Some(*element_type),
            DecodedArray::General(_) => None,
        }
    }

    pub fn items(&self) -> &[Option<Box<dyn Structure>>] {
        match self {
            DecodedArray::Typed { items, .. } | DecodedArray::General(items) => items,
        }
    }

    pub fn into_items(self) -> DecodedItems {
        match self {
            DecodedArray::Typed { items, .. } | DecodedArray::General(items) => items,
        }
    }

    pub fn get(&self, index: usize) -> Option<&dyn Structure> {
        self.items().get(index)?.as_deref()
    }

    /// Take the elements as `T`.
    ///
    /// Succeeds only for a typed array whose present elements are all exactly
    /// `T`; otherwise the array is handed back unchanged.
    pub fn into_typed<T: StructureType>(self) -> Result<Vec<Option<T>>, Self> {
        let exact = match &self {
            DecodedArray::Typed { element_type, items } => {
                *element_type == T::DESCRIPTOR && items.iter().flatten().all(|v| v.is::<T>())
            }
            DecodedArray::General(_) => false,
        };
        if !exact {
            return Err(self);
        }
        Ok(self
            .into_items()
            .into_iter()
            .map(|item| item.and_then(|v| v.downcast::<T>()))
            .collect())
    }
}

/// Decode `values` and type the result by the narrowest common type.
///
/// Elements whose type is not registered, or whose body does not parse,
/// become `None` without failing the array. A type id that cannot be
/// resolved against the namespace table fails the whole call.
pub fn decode_array(
    values: &[Option<ExtensionObject>],
    ctx: &EncoderContext,
    namespaces: Option<&NamespaceTable>,
) -> UaResult<DecodedArray> {
    let registry = ctx.registry();
    let mut items: DecodedItems = Vec::with_capacity(values.len());
    let mut best: Option<TypeDescriptor> = None;
    let mut unrelated = false;

    for (index, value) in values.iter().enumerate() {
        let decoded = match value {
            None => None,
            Some(envelope) => match envelope.decode(ctx, namespaces) {
                Ok(decoded) => decoded,
                Err(UaError::Decoding(reason)) => {
                    warn!(index, type_id = %envelope.type_id(), %reason, "Dropping undecodable array element");
                    None
                }
                Err(e) => return Err(e),
            },
        };

        if let Some(element) = &decoded {
            if !unrelated {
                match narrow(registry, best, element.descriptor()) {
                    Some(next) => best = Some(next),
                    None => unrelated = true,
                }
            }
        }
        items.push(decoded);
    }

    let Some(element_type) = best.filter(|_| !unrelated) else {
        return Ok(DecodedArray::General(items));
    };

    // Narrowing can pick a subtype that an earlier element is not an
    // instance of; such arrays stay general.
    let fits = items
        .iter()
        .flatten()
        .all(|item| registry.is_a(&item.descriptor(), &element_type));
    if !fits {
        debug!(element_type = element_type.name, "Elements do not share the narrowed type");
        return Ok(DecodedArray::General(items));
    }

    Ok(DecodedArray::Typed {
        element_type,
        items,
    })
}

/// Next running type, or `None` when `found` is unrelated to `best`.
fn narrow(
    registry: &TypeRegistry,
    best: Option<TypeDescriptor>,
    found: TypeDescriptor,
) -> Option<TypeDescriptor> {
    let Some(best) = best else {
        return Some(found);
    };
    if found == best || registry.is_supertype_of(&found, &best) {
        Some(best)
    } else if registry.is_supertype_of(&best, &found) {
        Some(found)
    } else {
        None
    }
}
