//! ExtensionObject: a self-describing envelope around a structure.
//!
//! The envelope carries the id of the encoding its body was written with
//! and either the raw body or a value that was never encoded. Which concrete
//! type lives inside is only known once the id has been resolved against a
//! namespace table and looked up in the type registry.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use uastack_types::namespace::NamespaceTable;
use uastack_types::structure::EncodeType;
use uastack_types::{ExpandedNodeId, Structure, StructureType, UaError, UaResult};

use crate::context::EncoderContext;

/// What an envelope holds.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtensionBody {
    Empty,
    Encoded(Vec<u8>),
    Decoded(Box<dyn Structure>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionObject {
    type_id: ExpandedNodeId,
    body: ExtensionBody,
}

impl ExtensionObject {
    pub fn empty(type_id: ExpandedNodeId) -> Self {
        Self {
            type_id,
            body: ExtensionBody::Empty,
        }
    }

    pub fn from_encoded(type_id: ExpandedNodeId, body: Vec<u8>) -> Self {
        Self {
            type_id,
            body: ExtensionBody::Encoded(body),
        }
    }

    /// Wrap an in-memory value, tagged with its binary encoding id.
    pub fn from_decoded(value: Box<dyn Structure>, ctx: &EncoderContext) -> Self {
        let type_id = ctx.encodeable_expanded_id(&value.descriptor(), EncodeType::Binary);
        Self {
            type_id,
            body: ExtensionBody::Decoded(value),
        }
    }

    /// Encode `value` into a new envelope.
    ///
    /// Fails with [`UaError::Encoding`] when the body exceeds the context's
    /// message size limit.
    pub fn encode<T: StructureType>(value: &T, ctx: &EncoderContext) -> UaResult<Self> {
        let body = serde_json::to_vec(value)
            .map_err(|e| UaError::Encoding(format!("{}: {e}", T::DESCRIPTOR.name)))?;
        if body.len() > ctx.max_message_size as usize {
            return Err(UaError::Encoding(format!(
                "{} body of {} bytes exceeds limit of {}",
                T::DESCRIPTOR.name,
                body.len(),
                ctx.max_message_size
            )));
        }
        Ok(Self::from_encoded(
            ctx.encodeable_expanded_id(&T::DESCRIPTOR, EncodeType::Binary),
            body,
        ))
    }

    pub fn type_id(&self) -> &ExpandedNodeId {
        &self.type_id
    }

    pub fn body(&self) -> &ExtensionBody {
        &self.body
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.body, ExtensionBody::Empty)
    }

    /// Decode the body.
    ///
    /// Returns `Ok(None)` for an empty envelope or one whose type is not in
    /// the registry. A type id whose namespace cannot be resolved fails with
    /// [`UaError::UnresolvedNamespace`]; a body that does not parse as its
    /// registered type fails with [`UaError::Decoding`]. Ids are resolved
    /// against `namespaces` when given, otherwise against the context's table.
    pub fn decode(
        &self,
        ctx: &EncoderContext,
        namespaces: Option<&NamespaceTable>,
    ) -> UaResult<Option<Box<dyn Structure>>> {
        let bytes = match &self.body {
            ExtensionBody::Empty => return Ok(None),
            ExtensionBody::Decoded(value) => return Ok(Some(value.clone())),
            ExtensionBody::Encoded(bytes) => bytes,
        };

        if bytes.len() > ctx.max_byte_string_length as usize {
            return Err(UaError::Decoding(format!(
                "body of {} bytes exceeds limit of {}",
                bytes.len(),
                ctx.max_byte_string_length
            )));
        }

        let table = namespaces.unwrap_or_else(|| ctx.namespaces());
        let qualified = table.qualify(&self.type_id)?;
        match ctx.registry().lookup(&qualified) {
            Some(entry) => entry.decode(bytes).map(Some),
            None => {
                debug!(type_id = %self.type_id, "No registered type for payload");
                Ok(None)
            }
        }
    }

    /// Decode and take the value as `T`.
    pub fn decode_as<T: StructureType>(&self, ctx: &EncoderContext) -> UaResult<T> {
        let value = self.decode(ctx, None)?.ok_or_else(|| {
            UaError::UnknownPayloadType(format!("{} did not decode to a value", self.type_id))
        })?;
        let found = value.descriptor().name;
        value.downcast::<T>().ok_or_else(|| {
            UaError::UnknownPayloadType(format!(
                "expected {}, found {found}",
                T::DESCRIPTOR.name
            ))
        })
    }
}

#[derive(Serialize, Deserialize)]
struct RawExtensionObject {
    type_id: ExpandedNodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body: Option<String>,
}

impl Serialize for ExtensionObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let body = match &self.body {
            ExtensionBody::Empty => None,
            ExtensionBody::Encoded(bytes) => Some(STANDARD.encode(bytes)),
            ExtensionBody::Decoded(value) => {
                let json = value.to_json().map_err(serde::ser::Error::custom)?;
                let bytes = serde_json::to_vec(&json).map_err(serde::ser::Error::custom)?;
                Some(STANDARD.encode(bytes))
            }
        };
        RawExtensionObject {
            type_id: self.type_id.clone(),
            body,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ExtensionObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawExtensionObject::deserialize(deserializer)?;
        match raw.body {
            None => Ok(Self::empty(raw.type_id)),
            Some(text) => {
                let bytes = STANDARD.decode(text).map_err(serde::de::Error::custom)?;
                Ok(Self::from_encoded(raw.type_id, bytes))
            }
        }
    }
}
