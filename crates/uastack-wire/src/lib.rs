//! Payload envelopes, polymorphic array decoding, and endpoint discovery.
//!
//! ## Architecture
//!
//! - **ExtensionObject**: a type id plus an encoded or already-decoded body
//! - **TypeRegistry**: known structure types and their supertype relation
//! - **EncoderContext**: namespace/server tables, registry and size limits
//! - **DecodedArray**: the narrowest common typed array, or the general form
//! - **EndpointServer**: a running transport listener answering discovery
//! - **WireMessage**: length-prefixed JSON frames used by discovery

pub mod client;
pub mod context;
pub mod decode;
pub mod extension;
pub mod message;
pub mod registry;
pub mod server;

pub use client::discover_endpoints;
pub use context::EncoderContext;
pub use decode::{decode_array, DecodedArray};
pub use extension::{ExtensionBody, ExtensionObject};
pub use message::{WireError, WireMessage, WireRequest, WireResponse};
pub use registry::{TypeRegistry, TypeRegistryBuilder};
pub use server::{
    EndpointServer, EndpointServerFactory, ListenerServer, ListenerServerFactory, ServerContext,
};
