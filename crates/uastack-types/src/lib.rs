//! Core types for the uastack identity, trust, and endpoint-negotiation layer.
//!
//! This crate defines the shared data structures used by the security
//! layer, the wire/decoding layer, and the application registry: node ids
//! and the namespace tables that resolve them, security enums, the
//! structure contract every encodeable type satisfies, and the handful of
//! structures whose behavior matters for endpoint negotiation. It contains
//! no business logic.

pub mod attributes;
mod bytes;
pub mod config;
pub mod discovery;
pub mod endpoint;
pub mod error;
pub mod identifiers;
pub mod locale;
pub mod namespace;
pub mod node_id;
pub mod security;
pub mod status;
pub mod structure;

pub use error::{UaError, UaResult};
pub use node_id::{ExpandedNodeId, Identifier, NodeId, QualifiedId};
pub use status::StatusCode;
pub use structure::{Structure, StructureType, TypeDescriptor};
