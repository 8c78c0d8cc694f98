//! Discovery service messages and configurations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::endpoint::EndpointDescription;
use crate::identifiers as id;
use crate::node_id::NodeId;
use crate::status::StatusCode;
use crate::structure::base_structure;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestHeader {
    pub authentication_token: NodeId,
    pub timestamp: DateTime<Utc>,
    pub request_handle: u32,
    pub return_diagnostics: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_entry_id: Option<String>,
    /// Milliseconds; 0 means no hint.
    pub timeout_hint: u32,
}

impl RequestHeader {
    pub fn new(request_handle: u32) -> Self {
        Self {
            request_handle,
            ..Default::default()
        }
    }
}

impl Default for RequestHeader {
    fn default() -> Self {
        Self {
            authentication_token: NodeId::null(),
            timestamp: Utc::now(),
            request_handle: 0,
            return_diagnostics: 0,
            audit_entry_id: None,
            timeout_hint: 0,
        }
    }
}

base_structure!(
    RequestHeader,
    id::REQUEST_HEADER,
    id::REQUEST_HEADER_ENCODING_BINARY,
    id::REQUEST_HEADER_ENCODING_XML
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseHeader {
    pub timestamp: DateTime<Utc>,
    pub request_handle: u32,
    pub service_result: StatusCode,
    pub string_table: Vec<String>,
}

impl ResponseHeader {
    /// A header answering `request` with `service_result`.
    pub fn for_request(request: &RequestHeader, service_result: StatusCode) -> Self {
        Self {
            timestamp: Utc::now(),
            request_handle: request.request_handle,
            service_result,
            string_table: Vec::new(),
        }
    }
}

impl Default for ResponseHeader {
    fn default() -> Self {
        Self {
            timestamp: Utc::now(),
            request_handle: 0,
            service_result: StatusCode::GOOD,
            string_table: Vec::new(),
        }
    }
}

base_structure!(
    ResponseHeader,
    id::RESPONSE_HEADER,
    id::RESPONSE_HEADER_ENCODING_BINARY,
    id::RESPONSE_HEADER_ENCODING_XML
);

/// Ask a server for its endpoints, optionally filtered by transport profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetEndpointsRequest {
    pub request_header: RequestHeader,
    pub endpoint_url: String,
    pub locale_ids: Vec<String>,
    /// Empty means every profile.
    pub profile_uris: Vec<String>,
}

impl GetEndpointsRequest {
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            ..Default::default()
        }
    }
}

base_structure!(
    GetEndpointsRequest,
    id::GET_ENDPOINTS_REQUEST,
    id::GET_ENDPOINTS_REQUEST_ENCODING_BINARY,
    id::GET_ENDPOINTS_REQUEST_ENCODING_XML
);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetEndpointsResponse {
    pub response_header: ResponseHeader,
    pub endpoints: Vec<EndpointDescription>,
}

base_structure!(
    GetEndpointsResponse,
    id::GET_ENDPOINTS_RESPONSE,
    id::GET_ENDPOINTS_RESPONSE_ENCODING_BINARY,
    id::GET_ENDPOINTS_RESPONSE_ENCODING_XML
);

/// Base of the discovery configuration family. Carries no fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfiguration {}

base_structure!(
    DiscoveryConfiguration,
    id::DISCOVERY_CONFIGURATION,
    id::DISCOVERY_CONFIGURATION_ENCODING_BINARY,
    id::DISCOVERY_CONFIGURATION_ENCODING_XML
);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MdnsDiscoveryConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mdns_server_name: Option<String>,
    pub server_capabilities: Vec<String>,
}

base_structure!(
    MdnsDiscoveryConfiguration,
    id::MDNS_DISCOVERY_CONFIGURATION,
    id::MDNS_DISCOVERY_CONFIGURATION_ENCODING_BINARY,
    id::MDNS_DISCOVERY_CONFIGURATION_ENCODING_XML,
    Some(id::DISCOVERY_CONFIGURATION)
);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BrowseDirection {
    #[default]
    Forward,
    Inverse,
    Both,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowseDescription {
    pub node_id: NodeId,
    pub browse_direction: BrowseDirection,
    pub reference_type_id: NodeId,
    pub include_subtypes: bool,
    pub node_class_mask: u32,
    pub result_mask: u32,
}

base_structure!(
    BrowseDescription,
    id::BROWSE_DESCRIPTION,
    id::BROWSE_DESCRIPTION_ENCODING_BINARY,
    id::BROWSE_DESCRIPTION_ENCODING_XML
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_fill_missing_fields() {
        let req: GetEndpointsRequest =
            serde_json::from_str(r#"{"endpoint_url":"opc.tcp://host:4840"}"#).unwrap();
        assert_eq!(req.endpoint_url, "opc.tcp://host:4840");
        assert!(req.profile_uris.is_empty());
        assert!(req.request_header.authentication_token.is_null());
    }

    #[test]
    fn test_response_header_echoes_handle() {
        let request = RequestHeader::new(42);
        let header = ResponseHeader::for_request(&request, StatusCode::GOOD);
        assert_eq!(header.request_handle, 42);
        assert!(header.service_result.is_good());
    }
}
